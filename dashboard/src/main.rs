//! Command-line shell over the dashboard session core.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use dashboard::DashboardSettings;
use ortho_config::OrthoConfig;
use dashboard::domain::{
    ApiError, ApiGateway, AuthEndpoints, AuthState, NavigationDecision, PageQuery, Route,
    RouteAuthorizer, SessionStore, SortDirection,
};
use dashboard::outbound::http::ReqwestTransport;
use dashboard::outbound::navigation::TracingNavigator;
use dashboard::outbound::storage::FileSessionStorage;

/// `dashboard` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dashboard",
    about = "Hospital dashboard session client: login, role-aware navigation and authorised API calls",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
        /// Destination requested before login was required.
        #[arg(long, value_name = "path")]
        from: Option<String>,
    },
    /// End the session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Decide where a navigation to `path` ends up.
    Navigate {
        /// Requested destination.
        path: String,
    },
    /// List the menu for the current role.
    Nav,
    /// Issue an authorised GET and print the response data.
    Get {
        /// API path relative to the base URL.
        path: String,
        /// Zero-based page index.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        size: Option<u32>,
        /// Sort as `field` or `field,asc|desc`.
        #[arg(long, value_name = "field[,direction]")]
        sort: Option<String>,
        /// Additional `key=value` filters.
        #[arg(long = "filter", value_name = "key=value", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
}

struct App {
    session: Arc<SessionStore>,
    gateway: ApiGateway,
    authorizer: RouteAuthorizer,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = DashboardSettings::load_from_iter([OsString::from("dashboard")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let app = build_app(&settings)?;
    app.session.initialize();

    match args.command {
        Command::Login {
            email,
            password,
            from,
        } => login(&app, &email, &password, from).await,
        Command::Logout => {
            app.session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            whoami(&app);
            Ok(())
        }
        Command::Navigate { path } => {
            navigate(&app, &path);
            Ok(())
        }
        Command::Nav => {
            nav(&app);
            Ok(())
        }
        Command::Get {
            path,
            page,
            size,
            sort,
            filters,
        } => {
            let query = page_query(page, size, sort.as_deref(), filters);
            get(&app, &path, &query).await
        }
    }
}

fn build_app(settings: &DashboardSettings) -> io::Result<App> {
    let api_url = settings.api_url().map_err(io::Error::other)?;
    let transport = Arc::new(
        ReqwestTransport::new(api_url, settings.request_timeout())
            .map_err(|error| io::Error::other(format!("create HTTP client: {error}")))?,
    );
    let storage_dir = settings.storage_dir();
    let storage = FileSessionStorage::open(&storage_dir).map_err(|error| {
        io::Error::other(format!(
            "open session storage '{}': {error}",
            storage_dir.display()
        ))
    })?;

    let auth = AuthEndpoints::new(transport.clone());
    let session = Arc::new(SessionStore::new(Arc::new(storage), auth.clone()));
    let gateway = ApiGateway::new(
        session.clone(),
        auth,
        transport,
        Arc::new(TracingNavigator::default()),
    );
    Ok(App {
        session,
        gateway,
        authorizer: RouteAuthorizer::default(),
    })
}

async fn login(app: &App, email: &str, password: &str, from: Option<String>) -> io::Result<()> {
    let success = app
        .session
        .login(email, password)
        .await
        .map_err(user_facing)?;
    let from = from.map(Route::new);
    let destination = app
        .authorizer
        .post_login_destination(from.as_ref(), success.role);
    println!(
        "logged in as {} <{}> ({})",
        success.user.full_name(),
        success.user.email(),
        success.role
    );
    println!("destination={destination}");
    Ok(())
}

fn whoami(app: &App) {
    match app.session.auth_state() {
        AuthState::Authenticated(user) => {
            println!("id={}", user.id());
            println!("name={}", user.full_name());
            println!("email={}", user.email());
            println!("role={}", user.role());
        }
        AuthState::Anonymous | AuthState::Initializing => println!("not logged in"),
    }
}

fn navigate(app: &App, path: &str) {
    match app.authorizer.resolve(path, &app.session.auth_state()) {
        NavigationDecision::Loading => println!("loading"),
        NavigationDecision::Render(route) => println!("render {route}"),
        NavigationDecision::Redirect { to, from } => match from {
            Some(from) => println!("redirect {to} (from {from})"),
            None => println!("redirect {to}"),
        },
    }
}

fn nav(app: &App) {
    let Some(user) = app.session.current_user() else {
        println!("not logged in");
        return;
    };
    for item in user.role().navigation() {
        println!("{:<20} {}", item.label, item.path);
    }
}

async fn get(app: &App, path: &str, query: &PageQuery) -> io::Result<()> {
    let data: Value = app
        .gateway
        .get_page(path, query)
        .await
        .map_err(user_facing)?;
    let rendered = serde_json::to_string_pretty(&data)
        .map_err(|error| io::Error::other(format!("render response: {error}")))?;
    println!("{rendered}");
    Ok(())
}

fn page_query(
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<&str>,
    filters: Vec<(String, String)>,
) -> PageQuery {
    let mut query = PageQuery::new();
    if let Some(page) = page {
        query = query.page(page);
    }
    if let Some(size) = size {
        query = query.size(size);
    }
    if let Some(sort) = sort {
        let (field, direction) = match sort.split_once(',') {
            Some((field, "asc")) => (field, Some(SortDirection::Asc)),
            Some((field, "desc")) => (field, Some(SortDirection::Desc)),
            Some((field, _)) => (field, None),
            None => (sort, None),
        };
        query = query.sort(field, direction);
    }
    filters
        .into_iter()
        .fold(query, |query, (key, value)| query.filter(key, value))
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .ok_or_else(|| format!("filter '{raw}' must be key=value"))
}

fn user_facing(error: ApiError) -> io::Error {
    warn!(%error, "request failed");
    io::Error::other(error.user_message().to_owned())
}
