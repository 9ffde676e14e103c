//! Rolegate interactive database session.

#![forbid(unsafe_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rolegate_application::{
    AccessGateService, GrantOutcome, QueryRequest, QueryVerdict, RoleAdminService, RoleListing,
    Session, SessionService,
};
use rolegate_core::{AppError, AppResult, UserIdentity};
use rolegate_domain::{Role, Table};
use rolegate_infrastructure::{
    PostgresEndpoint, PostgresQueryGateway, PostgresRoleStore, SupabaseIdentityVerifier,
};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct CliConfig {
    endpoint: PostgresEndpoint,
    supabase_url: String,
    supabase_key: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = CliConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let role_store = Arc::new(PostgresRoleStore::new(config.endpoint.clone()));
    let session_service = SessionService::new(
        Arc::new(SupabaseIdentityVerifier::new(
            http_client,
            config.supabase_url.clone(),
            config.supabase_key.clone(),
        )),
        role_store.clone(),
    );
    let admin_service = RoleAdminService::new(role_store);
    let gate_service = AccessGateService::new(Arc::new(PostgresQueryGateway::new(
        config.endpoint.clone(),
    )));

    info!(
        host = config.endpoint.host.as_str(),
        database = config.endpoint.database.as_str(),
        "rolegate-cli started"
    );
    println!("rolegate interactive session; type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session: Option<Session> = None;

    prompt();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|error| AppError::Internal(format!("failed to read stdin: {error}")))?
    {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();

        match command {
            "help" => print_help(),
            "exit" | "quit" => break,
            "login" => handle_login(&session_service, &mut session, rest, false).await,
            "register" => handle_login(&session_service, &mut session, rest, true).await,
            "query" | "exec" => handle_query(&gate_service, session.as_ref(), rest).await,
            "grant" => handle_grant(&admin_service, session.as_ref(), rest).await,
            "roles" => handle_listing(&admin_service, session.as_ref()).await,
            other => println!("unknown command '{other}'; type 'help' for commands"),
        }
        prompt();
    }

    println!("bye");
    Ok(())
}

async fn handle_login(
    service: &SessionService,
    session: &mut Option<Session>,
    args: &str,
    register: bool,
) {
    let mut parts = args.split_whitespace();
    let (Some(email), Some(password), None) = (parts.next(), parts.next(), parts.next()) else {
        let verb = if register { "register" } else { "login" };
        println!("usage: {verb} <email> <password>");
        return;
    };

    let outcome = if register {
        service.register(email, password).await
    } else {
        service.login(email, password).await
    };

    match outcome {
        Ok(Some(established)) => {
            if register {
                println!(
                    "registered as {} with role {}; ask an admin for access",
                    established.user_id, established.role
                );
            } else {
                println!(
                    "logged in as {} with role {}",
                    established.user_id, established.role
                );
            }
            *session = Some(established);
        }
        Ok(None) => println!("authentication failed"),
        Err(error) => println!("error: {error}"),
    }
}

async fn handle_query(service: &AccessGateService, session: Option<&Session>, sql: &str) {
    let Some(session) = session else {
        println!("not logged in; use 'login <email> <password>' first");
        return;
    };
    if sql.is_empty() {
        println!("usage: query <sql> (or exec <sql>)");
        return;
    }

    let request = QueryRequest {
        role: session.role,
        query: sql.to_owned(),
    };
    match service.execute(&request).await {
        Ok(QueryVerdict::Rows(table)) => print_table(&table),
        Ok(QueryVerdict::Written(affected)) => println!("ok, {affected} rows affected"),
        Ok(QueryVerdict::Denied(denial)) => println!("denied: {denial}"),
        Err(error) => println!("error: {error}"),
    }
}

async fn handle_grant(service: &RoleAdminService, session: Option<&Session>, args: &str) {
    let Some(session) = session else {
        println!("not logged in; use 'login <email> <password>' first");
        return;
    };

    let mut parts = args.split_whitespace();
    let (Some(target), Some(role_value), None) = (parts.next(), parts.next(), parts.next()) else {
        println!("usage: grant <user_id> <role>");
        return;
    };

    let role = match Role::from_str(role_value) {
        Ok(role) => role,
        Err(error) => {
            println!("error: {error}");
            return;
        }
    };

    let target = UserIdentity::new(target);
    match service
        .grant_or_update(&session.user_id, &target, role)
        .await
    {
        Ok(GrantOutcome::Applied) => println!("role {role} granted to {target}"),
        Ok(GrantOutcome::Denied(denial)) => println!("denied: {denial}"),
        Err(error) => println!("error: {error}"),
    }
}

async fn handle_listing(service: &RoleAdminService, session: Option<&Session>) {
    let Some(session) = session else {
        println!("not logged in; use 'login <email> <password>' first");
        return;
    };

    match service.list_roles(&session.user_id).await {
        Ok(RoleListing::Records(records)) => {
            if records.is_empty() {
                println!("(no role records)");
                return;
            }
            for record in records {
                println!("{}  {}", record.user_id, record.role);
            }
        }
        Ok(RoleListing::Denied(denial)) => println!("denied: {denial}"),
        Err(error) => println!("error: {error}"),
    }
}

fn print_table(table: &Table) {
    if table.is_empty() {
        println!("(no rows)");
        return;
    }
    println!("{}", table.columns.join(" | "));
    for row in &table.rows {
        println!("{}", row.join(" | "));
    }
    println!("({} rows)", table.row_count());
}

fn print_help() {
    println!("commands:");
    println!("  login <email> <password>     authenticate and start a session");
    println!("  register <email> <password>  create an account (no access until granted)");
    println!("  query <sql>                  run a read statement");
    println!("  exec <sql>                   run a write statement");
    println!("  grant <user_id> <role>       grant or update a role (admin only)");
    println!("  roles                        list role records (admin only)");
    println!("  help                         show this help");
    println!("  exit                         leave the session");
    println!("roles: unauthorized, read_access, read_write_access, admin");
}

fn prompt() {
    print!("> ");
    let _ = std::io::Write::flush(&mut std::io::stdout());
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

impl CliConfig {
    fn load() -> AppResult<Self> {
        let endpoint = PostgresEndpoint {
            host: defaulted_env("PG_HOST", "localhost"),
            pooler_host: defaulted_env("PG_HOST_POOLER", "localhost"),
            port: parse_env_u16("PG_PORT", 5432)?,
            database: defaulted_env("PG_DATABASE", ""),
            user: defaulted_env("PG_USER", ""),
            pooler_user: defaulted_env("PG_USER_POOLER", ""),
            password: defaulted_env("PG_PASSWORD", ""),
            schema: env::var("PG_SCHEMA").ok().filter(|value| !value.is_empty()),
        };

        Ok(Self {
            endpoint,
            supabase_url: required_env("SUPABASE_URL")?,
            supabase_key: required_env("SUPABASE_KEY")?,
        })
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Internal(format!("{name} is required")))
}

fn defaulted_env(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn parse_env_u16(name: &str, default: u16) -> AppResult<u16> {
    match env::var(name) {
        Ok(value) => value.parse::<u16>().map_err(|error| {
            AppError::Internal(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
