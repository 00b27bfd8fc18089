//! docqa command-line host.
//!
//! A small "UI layer" over the docqa client: the session is restored from
//! the token file on every invocation, redirects are printed instead of
//! rendered, and each subcommand maps to one client operation.
//!
//! Run with e.g.:
//!   docqa login a@x.com --password secret
//!   docqa documents list --page 2
//!   docqa ask "What was Q3 revenue?" --document 4

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use docqa::prelude::*;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docqa", about = "Document Q&A client", version)]
struct Cli {
    /// API root (overrides DOCQA_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Token file (overrides DOCQA_TOKEN_PATH).
    #[arg(long, global = true)]
    token_path: Option<PathBuf>,

    /// Request timeout in seconds (overrides DOCQA_TIMEOUT_SECS).
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Print auth results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login {
        email: String,
        #[arg(long, env = "DOCQA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account (does not log in).
    Register {
        email: String,
        #[arg(long, env = "DOCQA_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
    },
    /// End the session and forget the token.
    Logout,
    /// Show who the stored token belongs to.
    Whoami,
    /// Manage documents.
    #[command(subcommand)]
    Documents(DocumentCommand),
    /// Ask a question.
    Ask {
        question: String,
        /// Restrict the question to one document.
        #[arg(long)]
        document: Option<i64>,
    },
    /// Show the query history.
    Queries {
        #[arg(long)]
        document: Option<i64>,
    },
    /// Mark a query as favorite (or clear it with --unset).
    Favorite {
        id: i64,
        #[arg(long)]
        unset: bool,
    },
}

#[derive(Subcommand)]
enum DocumentCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        per_page: u64,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: i64,
    },
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docqa=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_client(cli: &Cli) -> Result<DocQaClient, DocQaError> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = cli.timeout {
        config = config.timeout(Duration::from_secs(secs));
    }

    let store = match &cli.token_path {
        Some(path) => FileTokenStore::new(path),
        None => FileTokenStore::at_default_location()?,
    };

    DocQaClient::builder()
        .config(config)
        .token_store(store)
        .navigator(|route: Route| match route {
            Route::Home => eprintln!("-> signed in"),
            Route::Login => eprintln!("-> signed out; run `docqa login` to continue"),
        })
        .build()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(&cli)?;
    let session = client.session();
    session_restore(&client).await;

    match cli.command {
        Command::Login { email, password } => {
            let result = session.login(&email, &password).await;
            report(&result, cli.json)?;
            result?;
            if let Some(name) = session.user().as_ref().and_then(Identity::display_name) {
                println!("logged in as {name}");
            }
        }
        Command::Register {
            email,
            password,
            full_name,
        } => {
            let result = session.register(&email, &password, &full_name).await;
            report(&result, cli.json)?;
            result?;
            println!("account created; run `docqa login {email}`");
        }
        Command::Logout => session.logout(),
        Command::Whoami => {
            let user = session.require_user()?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Documents(command) => {
            session.require_user()?;
            documents(&client, command).await?;
        }
        Command::Ask { question, document } => {
            session.require_user()?;
            let response = client
                .queries()
                .create(&QueryCreate {
                    query_text: question,
                    document_id: document.map(DocumentId),
                    meta_data: None,
                })
                .await?;
            println!("{}", response.query.response.as_deref().unwrap_or("(no answer)"));
            for citation in &response.citations {
                println!("  [{}] {}", citation.document_section_id, citation.content);
            }
        }
        Command::Queries { document } => {
            session.require_user()?;
            let params = QueryListParams {
                document_id: document.map(DocumentId),
                ..QueryListParams::default()
            };
            let list = client.queries().list(&params).await?;
            for query in &list.queries {
                let star = if query.is_favorite { "*" } else { " " };
                println!("{star} {:>5}  {}", query.id.0, query.query_text);
            }
            println!("{} total", list.total);
        }
        Command::Favorite { id, unset } => {
            session.require_user()?;
            let update = QueryUpdate {
                is_favorite: Some(!unset),
                ..QueryUpdate::default()
            };
            let query = client.queries().update(QueryId(id), &update).await?;
            println!("{} favorite: {}", query.id, query.is_favorite);
        }
    }

    Ok(())
}

/// Restores the persisted session, like an app does on launch.
async fn session_restore(client: &DocQaClient) {
    let status = client.initialize().await;
    tracing::debug!(%status, "session restored");
}

fn report(
    result: &Result<(), AuthFailure>,
    json: bool,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(&AuthOutcome::from(result))?);
    }
    Ok(())
}

async fn documents(
    client: &DocQaClient,
    command: DocumentCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = client.documents();
    match command {
        DocumentCommand::List {
            page,
            per_page,
            search,
        } => {
            let mut params = ListParams::page(page, per_page);
            if let Some(term) = search {
                params = params.with_search(term);
            }
            let list = api.list(&params).await?;
            for doc in &list.documents {
                println!("{:>5}  {:<40}  {} bytes", doc.id.0, doc.title, doc.file_size);
            }
            println!("page {page} of {}", list.total_pages(per_page));
        }
        DocumentCommand::Show { id } => {
            let doc = api.get(DocumentId(id)).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        DocumentCommand::Upload {
            file,
            title,
            description,
        } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut request = UploadRequest::new(title, file_name, bytes);
            if let Some(description) = description {
                request = request.description(description);
            }
            let doc = api.upload(request).await?;
            println!("uploaded {} ({})", doc.title, doc.id);
        }
        DocumentCommand::Delete { id } => {
            api.delete(DocumentId(id)).await?;
            println!("deleted {}", DocumentId(id));
        }
    }
    Ok(())
}
