//! catalog-admin - command-line back office for the research and
//! internship project catalog.
//!
//! Each invocation is its own browsing context: a login without
//! `--remember` lasts only as long as the command that made it.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use catalog_core::api::{ApiClient, FilePart, ReqwestTransport, RequestError};
use catalog_core::auth::{
    CredentialStore, FileStorage, KeyringStorage, MemoryStorage, SessionController,
    SessionState, StorageBackend,
};
use catalog_core::catalog::{
    CatalogError, CatalogService, Collection, Internships, PartnerDraft, Partners, ProjectDraft,
    RemoteList, Research,
};
use catalog_core::config::{Config, DurableStore};
use catalog_core::models::{paginate, INTERNSHIP_CATEGORY, PUBLIC_ITEMS_PER_PAGE, RESEARCH_CATEGORY};
use catalog_core::routing::{RouteGate, Router};

/// Log file name prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "catalog-admin.log";

#[derive(Parser)]
#[command(name = "catalog-admin", version, about = "Manage the project catalog")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and open the dashboard
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Keep the session for later runs
        #[arg(long)]
        remember: bool,
    },
    Logout,
    /// Show the current session
    Status,
    /// Show where a navigation to PATH would land
    Gate { path: String },
    Dashboard,
    List {
        kind: Kind,
        #[arg(long)]
        search: Option<String>,
    },
    Delete { kind: Kind, slug: String },
    CreatePartner {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: PathBuf,
    },
    /// Rename a partner, replacing its logo when --image is given
    UpdatePartner {
        slug: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    CreateProject {
        kind: ProjectKind,
        #[command(flatten)]
        fields: ProjectFields,
    },
    UpdateProject {
        kind: ProjectKind,
        slug: String,
        #[command(flatten)]
        fields: ProjectFields,
    },
    /// Show the signed-in administrator
    Profile,
    /// Upload a new avatar for the signed-in administrator
    ProfileImage { path: PathBuf },
    /// Browse the public catalog
    Public {
        #[arg(long, conflicts_with = "partners")]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// List partner logos instead of products
        #[arg(long)]
        partners: bool,
    },
    /// Show or change the saved settings
    Config(ConfigArgs),
}

#[derive(Args)]
struct ProjectFields {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    link: Option<String>,
    #[arg(long)]
    thumbnail: Option<PathBuf>,
    #[arg(long = "file")]
    files: Vec<PathBuf>,
}

impl ProjectFields {
    fn into_draft(self) -> Result<ProjectDraft> {
        let mut draft = ProjectDraft::new(self.title).description(self.description);
        if let Some(link) = self.link {
            draft = draft.project_link(link);
        }
        if let Some(path) = self.thumbnail {
            draft = draft.thumbnail(read_file(&path)?);
        }
        for path in &self.files {
            draft = draft.file(read_file(path)?);
        }
        Ok(draft)
    }
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    asset_url: Option<String>,
    /// Lifetime of a remembered session
    #[arg(long)]
    remember_days: Option<i64>,
    #[arg(long)]
    store: Option<StoreKind>,
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl ConfigArgs {
    fn is_empty(&self) -> bool {
        self.api_url.is_none()
            && self.asset_url.is_none()
            && self.remember_days.is_none()
            && self.store.is_none()
            && self.log_dir.is_none()
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Internships,
    Research,
    Partners,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProjectKind {
    Internships,
    Research,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    File,
    Keyring,
}

impl From<StoreKind> for DurableStore {
    fn from(kind: StoreKind) -> Self {
        match kind {
            StoreKind::File => DurableStore::File,
            StoreKind::Keyring => DurableStore::Keyring,
        }
    }
}

/// A change to one collection, applied through its list.
enum Mutation<'a, C: Collection> {
    Create(&'a C::Draft),
    Update(&'a str, &'a C::Draft),
    Delete(&'a str),
}

/// Everything a command needs, wired once.
struct App {
    router: Arc<Router>,
    controller: Arc<SessionController>,
    catalog: CatalogService,
    /// Backing file of the durable tier, unless the keyring is used
    storage_file: Option<PathBuf>,
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug). With a log
/// directory configured, a daily file is written as well.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

impl App {
    fn build(config: &Config, json: bool) -> Result<Self> {
        let (durable, storage_file): (Arc<dyn StorageBackend>, Option<PathBuf>) =
            match config.durable_store {
                DurableStore::File => {
                    let storage = FileStorage::new(config.storage_path()?);
                    let path = storage.path().to_path_buf();
                    (Arc::new(storage), Some(path))
                }
                DurableStore::Keyring => (Arc::new(KeyringStorage::new()), None),
            };
        let store = Arc::new(
            CredentialStore::new(Arc::new(MemoryStorage::new()), durable)
                .with_remember_for(config.remember_for()),
        );

        let transport = ReqwestTransport::new(config.request_timeout())
            .context("Failed to build HTTP client")?;
        let api = ApiClient::new(Arc::new(transport), store.clone(), config.api_base_url());

        let gate = RouteGate::default();
        let router = Arc::new(Router::new(gate.clone(), store));
        let controller = Arc::new(SessionController::new(api.clone(), router.clone(), &gate));
        let catalog = CatalogService::new(api, config.asset_base_url());

        Ok(Self {
            router,
            controller,
            catalog,
            storage_file,
            json,
        })
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login { email, remember } => self.login(email, remember).await,
            Command::Logout => {
                self.controller.logout()?;
                println!("Logged out");
                Ok(())
            }
            Command::Status => {
                self.status();
                Ok(())
            }
            Command::Gate { path } => {
                self.gate(&path);
                Ok(())
            }
            Command::Dashboard => self.dashboard().await,
            Command::List { kind, search } => match kind {
                Kind::Internships => self.list::<Internships>(search.as_deref()).await,
                Kind::Research => self.list::<Research>(search.as_deref()).await,
                Kind::Partners => self.list::<Partners>(search.as_deref()).await,
            },
            Command::Delete { kind, slug } => match kind {
                Kind::Internships => self.mutate::<Internships>(Mutation::Delete(&slug)).await,
                Kind::Research => self.mutate::<Research>(Mutation::Delete(&slug)).await,
                Kind::Partners => self.mutate::<Partners>(Mutation::Delete(&slug)).await,
            },
            Command::CreatePartner { name, image } => {
                let draft = PartnerDraft::new(name).image(read_file(&image)?);
                self.mutate::<Partners>(Mutation::Create(&draft)).await
            }
            Command::UpdatePartner { slug, name, image } => {
                let mut draft = PartnerDraft::new(name);
                if let Some(path) = image {
                    draft = draft.image(read_file(&path)?);
                }
                self.mutate::<Partners>(Mutation::Update(&slug, &draft))
                    .await
            }
            Command::CreateProject { kind, fields } => {
                let draft = fields.into_draft()?;
                match kind {
                    ProjectKind::Internships => {
                        self.mutate::<Internships>(Mutation::Create(&draft)).await
                    }
                    ProjectKind::Research => {
                        self.mutate::<Research>(Mutation::Create(&draft)).await
                    }
                }
            }
            Command::UpdateProject { kind, slug, fields } => {
                let draft = fields.into_draft()?;
                match kind {
                    ProjectKind::Internships => {
                        self.mutate::<Internships>(Mutation::Update(&slug, &draft))
                            .await
                    }
                    ProjectKind::Research => {
                        self.mutate::<Research>(Mutation::Update(&slug, &draft))
                            .await
                    }
                }
            }
            Command::Profile => self.profile().await,
            Command::ProfileImage { path } => {
                self.catalog
                    .update_profile_image(read_file(&path)?)
                    .await
                    .map_err(request_failure)?;
                println!("Profile image updated");
                Ok(())
            }
            Command::Public {
                category,
                page,
                partners,
            } => {
                if partners {
                    self.public_partners().await
                } else {
                    self.public(category, page).await
                }
            }
            // Applied in main before the app is wired
            Command::Config(_) => Ok(()),
        }
    }

    async fn login(&self, email: Option<String>, remember: bool) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => prompt_email(self.controller.remembered_email())?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        match self.controller.login(&email, &password, remember).await {
            Ok(session) => {
                let landed = self.router.current().unwrap_or_default();
                println!("Logged in as {} ({})", session.issued_to.email, landed);
                if !remember {
                    println!("Session is not remembered and ends with this command");
                }
                Ok(())
            }
            Err(e) => anyhow::bail!(e.user_message()),
        }
    }

    fn status(&self) {
        match self.controller.state() {
            SessionState::Authenticated(session) => {
                println!(
                    "Logged in as {} <{}> ({})",
                    session.issued_to.name, session.issued_to.email, session.issued_to.role
                );
                if let Some(days) = session.days_until_expiry() {
                    println!("Remembered for {} more day(s)", days);
                }
            }
            _ => {
                println!("Not logged in");
                if let Some(email) = self.controller.remembered_email() {
                    println!("Remembered email: {}", email);
                }
            }
        }
        println!("API:      {}", self.catalog.api().base_url());
        match &self.storage_file {
            Some(path) => println!("Sessions: {}", path.display()),
            None => println!("Sessions: OS keyring"),
        }
    }

    fn gate(&self, path: &str) {
        let landed = self.router.resolve(path);
        if landed == path {
            println!("{} -> allowed", path);
        } else {
            println!("{} -> redirected to {}", path, landed);
        }
    }

    async fn dashboard(&self) -> Result<()> {
        let stats = self
            .catalog
            .dashboard_stats()
            .await
            .map_err(request_failure)?;
        println!("Total Internships: {}", stats.internships);
        println!("Total Research:    {}", stats.research);
        println!("Total Partners:    {}", stats.partners);
        Ok(())
    }

    async fn list<C>(&self, search: Option<&str>) -> Result<()>
    where
        C: Collection,
        C::Item: serde::Serialize + Listed,
    {
        let mut list = RemoteList::<C>::new(self.catalog.clone());
        list.refresh().await.map_err(request_failure)?;

        let items = list.filtered(search.unwrap_or_default());
        if self.json {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }
        if items.is_empty() {
            println!("No {} found", C::LABEL);
        }
        for item in items {
            println!("{}", item.line());
        }
        Ok(())
    }

    /// Apply a change, then report the reloaded list or why it did not reload.
    async fn mutate<C: Collection>(&self, mutation: Mutation<'_, C>) -> Result<()> {
        let mut list = RemoteList::<C>::new(self.catalog.clone());
        let (result, done) = match mutation {
            Mutation::Create(draft) => (list.create(draft).await, "Created".to_string()),
            Mutation::Update(slug, draft) => {
                (list.update(slug, draft).await, format!("Updated {}", slug))
            }
            Mutation::Delete(slug) => (list.delete(slug).await, format!("Deleted {}", slug)),
        };
        result.map_err(catalog_failure)?;

        println!("{}", done);
        match list.last_error() {
            Some(error) => eprintln!("Warning: {}", error),
            None => println!("{} {} record(s) on the server", list.items().len(), C::LABEL),
        }
        Ok(())
    }

    async fn profile(&self) -> Result<()> {
        let profile = self
            .catalog
            .fetch_profile()
            .await
            .map_err(request_failure)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            return Ok(());
        }
        println!("[{}] {}", profile.initials(), profile.name);
        println!("Email: {}", profile.email);
        println!("Role:  {}", profile.role);
        match profile.image.as_deref().filter(|_| profile.has_image()) {
            Some(image) => println!("Image: {}", image),
            None => println!("Image: none"),
        }
        Ok(())
    }

    async fn public(&self, category: Option<String>, page: usize) -> Result<()> {
        let category = category.map(|c| match c.to_ascii_lowercase().as_str() {
            "internship" | "internships" => INTERNSHIP_CATEGORY.to_string(),
            "research" => RESEARCH_CATEGORY.to_string(),
            _ => c,
        });
        let products = self
            .catalog
            .fetch_public_products(category.as_deref())
            .await
            .map_err(request_failure)?;

        let page = paginate(&products, page, PUBLIC_ITEMS_PER_PAGE);
        if self.json {
            println!("{}", serde_json::to_string_pretty(page.items)?);
            return Ok(());
        }
        for product in page.items {
            println!("{:<40} {}", product.title, product.slug);
        }
        println!("Page {} of {}", page.page, page.total_pages.max(1));
        Ok(())
    }

    async fn public_partners(&self) -> Result<()> {
        let partners = self
            .catalog
            .fetch_public_partners()
            .await
            .map_err(request_failure)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&partners)?);
            return Ok(());
        }
        for partner in &partners {
            println!(
                "{:<32} {:<48} {}",
                partner.name,
                partner.logo,
                partner.website.as_deref().unwrap_or("-")
            );
        }
        Ok(())
    }
}

fn request_failure(e: RequestError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

fn catalog_failure(e: CatalogError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

/// Apply `args` to the saved settings, or print them when none are given.
fn configure(mut config: Config, args: ConfigArgs) -> Result<()> {
    if args.is_empty() {
        println!("{}", serde_json::to_string_pretty(&config)?);
        println!("Saved at {}", Config::config_path()?.display());
        return Ok(());
    }

    if let Some(url) = args.api_url {
        config.api_base_url = Some(url);
    }
    if let Some(url) = args.asset_url {
        config.asset_base_url = Some(url);
    }
    if let Some(days) = args.remember_days {
        config.remember_days = Some(days);
    }
    if let Some(store) = args.store {
        config.durable_store = store.into();
    }
    if let Some(dir) = args.log_dir {
        config.log_dir = Some(dir);
    }
    config.save()?;
    info!("Configuration saved");
    println!("Saved to {}", Config::config_path()?.display());
    Ok(())
}

/// One-line rendering for `list`.
trait Listed {
    fn line(&self) -> String;
}

impl Listed for catalog_core::models::Project {
    fn line(&self) -> String {
        format!(
            "{:<32} {:<40} {:<20} {}",
            self.slug,
            catalog_core::utils::truncate(&self.title, 40),
            self.author.as_deref().unwrap_or("-"),
            self.attachment_name().unwrap_or("-")
        )
    }
}

impl Listed for catalog_core::models::Partner {
    fn line(&self) -> String {
        format!("{:<32} {}", self.slug, self.name)
    }
}

fn prompt_email(remembered: Option<String>) -> Result<String> {
    match &remembered {
        Some(email) => print!("Email [{}]: ", email),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(remembered.unwrap_or_default());
    }
    Ok(line.to_string())
}

fn read_file(path: &Path) -> Result<FilePart> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let mime = FilePart::mime_for(&file_name);
    Ok(FilePart::new(file_name, mime, bytes))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    let _guard = init_tracing(config.log_dir.as_deref());

    if let Command::Config(args) = cli.command {
        return configure(config, args);
    }

    config.apply_env_overrides();
    info!(api = config.api_base_url(), "catalog-admin starting");

    let app = App::build(&config, cli.json)?;
    let was_authenticated = app.controller.is_authenticated();
    let listener = app.controller.spawn_forced_logout();

    let result = app.run(cli.command).await;

    // On the single-threaded runtime one yield lets the listener apply a denial
    tokio::task::yield_now().await;
    if result.is_err() && was_authenticated && !app.controller.is_authenticated() {
        warn!("Session revoked by the server");
        eprintln!("Session expired, logged out");
    }
    listener.abort();
    result
}
