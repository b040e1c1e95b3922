//! FICCT CLI - Command-line front-end for the FICCT scheduling API
//!
//! Signs in, keeps the session between runs, and lists what the signed-in
//! role is allowed to see.

use clap::{Parser, Subcommand};
use ficct_client::{
    ApiGateway, ApiResponse, BitacoraQuery, DashboardStats, Day, LoginCredentials, LoginData,
    PageQuery, ScheduleGrid,
};
use ficct_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, ErrorContext,
    FicctConfig, FicctError, FicctResult,
};
use ficct_session::{visible_items, AuthContext, Navigator, Role, RouteGuard, SessionStore};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ficct")]
#[command(about = "Client for the FICCT academic scheduling API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL, overriding environment and configuration file
    #[arg(long)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// End the session on the server and locally
    Logout,

    /// Show the stored session
    Whoami,

    /// Check whether the session may open a page restricted to ROLES
    CanAccess {
        #[arg(required = true)]
        roles: Vec<Role>,
    },

    /// Check whether the session holds a permission
    HasPermission { name: String },

    /// List the navigation entries visible to the session
    Menu,

    /// Enter a protected area the way the dashboard layout does
    Guard {
        /// Roles the area is restricted to, comma separated; empty for any
        #[arg(value_delimiter = ',')]
        roles: Vec<Role>,
    },

    /// Instructor management
    Docentes {
        #[command(subcommand)]
        action: DocenteAction,
    },

    /// Weekly timetable
    Horario {
        /// Show this instructor's timetable instead of your own
        #[arg(long)]
        docente: Option<u64>,
    },

    /// Dashboard counters
    Dashboard,

    /// Audit log
    Bitacora {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long)]
        accion: Option<String>,

        #[arg(long)]
        usuario: Option<String>,
    },

    /// Issue a GET against any endpoint and print the envelope
    Get { endpoint: String },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum DocenteAction {
    /// List instructors
    List {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long)]
        per_page: Option<u32>,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one instructor
    Show { id: u64 },

    /// Activate or deactivate an instructor
    Toggle { id: u64 },
}

/// Prints navigations instead of performing them
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn replace(&self, path: &str) {
        println!("↪ Redirecting to {}", path);
    }
}

#[tokio::main]
async fn main() -> FicctResult<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    config.apply_env_overrides();
    if let Some(url) = &cli.api_url {
        config.api.base_url = Some(url.clone());
    }

    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }

    init_logging(&logging_config).map_err(|e| FicctError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the [logging] section of the configuration"),
    })?;

    debug!("Starting FICCT CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config {
        show,
        init,
        validate,
    } = cli.command
    {
        return handle_config(&config, show, init, validate);
    }

    let session = SessionStore::from_config(&config.session);
    let gateway = ApiGateway::from_config(&config, session.clone())?;

    let result = match cli.command {
        Commands::Login { email, password } => handle_login(&gateway, email, password).await,
        Commands::Logout => handle_logout(&gateway).await,
        Commands::Whoami => handle_whoami(&session),
        Commands::CanAccess { roles } => {
            let ctx = AuthContext::from_store(&session);
            let allowed = ctx.can_access(roles);
            println!("{}", if allowed { "✅ allowed" } else { "❌ denied" });
            Ok(())
        }
        Commands::HasPermission { name } => {
            let ctx = AuthContext::from_store(&session);
            let held = ctx.has_permission(&name);
            println!("{}", if held { "✅ granted" } else { "❌ not granted" });
            Ok(())
        }
        Commands::Menu => {
            let ctx = AuthContext::from_store(&session);
            for item in visible_items(&ctx) {
                println!("{:<24} {}", item.label, item.path);
            }
            Ok(())
        }
        Commands::Guard { roles } => {
            let mut guard = RouteGuard::new(ConsoleNavigator).with_requirement(roles);
            let state = guard.check(&session);
            println!("Guard: {:?} ({:?})", state, guard.render());
            Ok(())
        }
        Commands::Docentes { action } => handle_docentes(&gateway, action).await,
        Commands::Horario { docente } => handle_horario(&gateway, docente).await,
        Commands::Dashboard => handle_dashboard(&gateway).await,
        Commands::Bitacora {
            page,
            accion,
            usuario,
        } => handle_bitacora(&gateway, page, accion, usuario).await,
        Commands::Get { endpoint } => {
            let response = gateway.get(&endpoint).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    };

    if let Err(e) = &result {
        e.log();
    }
    result
}

fn load_config(config_path: Option<&PathBuf>) -> FicctResult<FicctConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return FicctConfig::from_file(path);
    }

    let default_paths = [
        Some(get_config_path()),
        dirs::home_dir().map(|d| d.join(".ficct").join("config.toml")),
        Some(PathBuf::from("ficct.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return FicctConfig::from_file(path);
        }
    }

    debug!("No configuration file found, using defaults");
    Ok(FicctConfig::default())
}

/// Default configuration file path
fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ficct")
        .join("config.toml")
}

fn handle_config(config: &FicctConfig, show: bool, init: bool, validate: bool) -> FicctResult<()> {
    if init {
        let config_path = get_config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        FicctConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {:?}", config_path);
    }

    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| FicctError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("config_show"),
        })?;
        println!("📋 Current configuration:");
        println!("{}", rendered);
        println!("# resolved api base url: {}", config.api.resolved_base_url());
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

async fn handle_login(gateway: &ApiGateway, email: String, password: String) -> FicctResult<()> {
    log_operation_start!("login", base_url = gateway.base_url());

    let response = gateway
        .login(&LoginCredentials::new(email, password))
        .await;
    let login = match confirm_login(response) {
        Ok(login) => login,
        Err(e) => {
            log_operation_error!("login", e);
            return Err(e);
        }
    };

    log_operation_success!("login");
    match login.role {
        Some(role) => println!("✅ Signed in as {} ({})", role.display_name(), role.home_path()),
        None => println!("✅ Signed in"),
    }
    Ok(())
}

/// Session the server just issued
///
/// Read from the response rather than the store, which may still hold an
/// earlier session when the server answers without a token.
fn confirm_login(response: ApiResponse) -> FicctResult<LoginData> {
    let data = response.into_result("login")?;
    data.as_ref()
        .and_then(LoginData::from_value)
        .ok_or_else(|| FicctError::Internal {
            message: "The server accepted the login but sent no token".to_string(),
            source: None,
            context: ErrorContext::new("cli").with_operation("login"),
        })
}

async fn handle_logout(gateway: &ApiGateway) -> FicctResult<()> {
    if !gateway.session().is_authenticated() {
        println!("No active session");
        return Ok(());
    }

    gateway.logout().await.into_result("logout")?;
    println!("👋 Signed out");
    Ok(())
}

fn handle_whoami(session: &SessionStore) -> FicctResult<()> {
    let snapshot = session.snapshot();
    if !snapshot.is_authenticated() {
        return Err(ficct_core::auth_error!("No active session", "cli"));
    }

    let ctx = AuthContext::from_session(&snapshot);
    println!("User:        {}", snapshot.user_name().unwrap_or("(unknown)"));
    println!(
        "Role:        {}",
        ctx.role().map(|r| r.display_name()).unwrap_or("(none)")
    );
    let permissions: Vec<&str> = ctx.permissions().iter().collect();
    println!("Permissions: {}", permissions.join(", "));
    debug!("{}", ctx.summary());
    Ok(())
}

async fn handle_docentes(gateway: &ApiGateway, action: DocenteAction) -> FicctResult<()> {
    match action {
        DocenteAction::List {
            page,
            per_page,
            search,
        } => {
            let mut query = PageQuery::new().page(page);
            if let Some(per_page) = per_page {
                query = query.per_page(per_page);
            }
            if let Some(search) = search {
                query = query.search(search);
            }

            let Some(page) = gateway.list_docentes(&query).await.into_result("list_docentes")?
            else {
                return Ok(());
            };
            for docente in &page.data {
                let estado = match docente.activo {
                    Some(false) => "inactivo",
                    _ => "activo",
                };
                println!("{:>5}  {:<40} {}", docente.id, docente.full_name(), estado);
            }
            println!(
                "Page {}/{} ({} total)",
                page.current_page, page.last_page, page.total
            );
        }
        DocenteAction::Show { id } => {
            if let Some(docente) = gateway.get_docente(id).await.into_result("get_docente")? {
                println!("{}", serde_json::to_string_pretty(&docente)?);
            }
        }
        DocenteAction::Toggle { id } => {
            let response = gateway.toggle_docente_estado(id).await;
            let message = response.message_or("Estado actualizado");
            response.into_result("toggle_docente_estado")?;
            println!("✅ {}", message);
        }
    }
    Ok(())
}

async fn handle_horario(gateway: &ApiGateway, docente: Option<u64>) -> FicctResult<()> {
    let response = match docente {
        Some(id) => gateway.horario_docente(id).await,
        None => gateway.mi_horario().await,
    };
    let entries = response.into_result("horario")?.unwrap_or_default();
    let grid = ScheduleGrid::from_entries(entries);

    if grid.is_empty() {
        println!("No classes scheduled");
        return Ok(());
    }

    print!("{:<13}", "");
    for day in Day::ALL {
        print!("{:<12}", day.label());
    }
    println!();

    for block in grid.blocks() {
        print!("{:<13}", block.to_string());
        for day in Day::ALL {
            let cell: Vec<&str> = grid
                .cell(day, &block)
                .iter()
                .map(|h| h.materia.as_deref().unwrap_or("?"))
                .collect();
            print!("{:<12}", cell.join("/"));
        }
        println!();
    }

    for (day, block, entries) in grid.conflicts() {
        println!("⚠ {} {}: {} classes share this slot", day, block, entries.len());
    }
    if !grid.unplaced().is_empty() {
        println!("⚠ {} entries without a valid day or time", grid.unplaced().len());
    }
    Ok(())
}

async fn handle_dashboard(gateway: &ApiGateway) -> FicctResult<()> {
    let stats = DashboardStats::load(gateway).await;
    println!("Docentes: {}", stats.docentes);
    println!("Materias: {}", stats.materias);
    println!("Carreras: {}", stats.carreras);
    println!("Periodos: {}", stats.periodos);
    for (counter, message) in &stats.failures {
        println!("⚠ {}: {}", counter, message);
    }
    Ok(())
}

async fn handle_bitacora(
    gateway: &ApiGateway,
    page: u32,
    accion: Option<String>,
    usuario: Option<String>,
) -> FicctResult<()> {
    let query = BitacoraQuery {
        page: PageQuery::new().page(page),
        accion,
        usuario,
        ..Default::default()
    };

    if let Some(page) = gateway.list_bitacoras(&query).await.into_result("list_bitacoras")? {
        for entry in &page.data {
            println!(
                "{:<20} {:<16} {:<12} {}",
                entry.created_at.as_deref().unwrap_or("-"),
                entry.usuario.as_deref().unwrap_or("-"),
                entry.accion,
                entry.descripcion.as_deref().unwrap_or("")
            );
        }
        println!("Page {}/{}", page.current_page, page.last_page);
    }
    Ok(())
}
