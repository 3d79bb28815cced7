//! User Service - command-line access to user records.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::{FilterOptions, OptionKey};
use domain::User;
use user_service_lib::config::UserServiceConfig;
use user_service_lib::service::UserService;

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "User record administration over the document store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check database connectivity
    Ping,
    /// Look up a single user
    Get(Lookup),
    /// List users matching the given filters
    List(ListArgs),
    /// Create a user
    Add(AddArgs),
    /// Permanently delete a user
    Delete { id: String },
    /// Replace a user's token (generated when omitted)
    RotateToken {
        id: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Replace a user's password (generated when omitted)
    ResetPassword {
        id: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Change a user's phone number
    SetPhone { id: String, phone: String },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Lookup {
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    institution: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    guid: Option<String>,
    #[arg(long)]
    id_card: Option<String>,
    #[arg(long)]
    sex: Option<i32>,
    #[arg(long)]
    disable: Option<bool>,
    #[arg(long)]
    status: Option<i32>,
    /// Earliest birth date (inclusive)
    #[arg(long)]
    born_from: Option<NaiveDate>,
    /// Latest birth date (inclusive)
    #[arg(long)]
    born_to: Option<NaiveDate>,
    #[arg(long)]
    created_from: Option<DateTime<Utc>>,
    #[arg(long)]
    created_to: Option<DateTime<Utc>>,
    #[arg(long)]
    modified_from: Option<DateTime<Utc>>,
    #[arg(long)]
    modified_to: Option<DateTime<Utc>>,
    #[arg(long, default_value = "0")]
    skip: u64,
    /// Page size, 0 for unbounded
    #[arg(long, default_value = "20")]
    limit: u64,
    /// Option key to sort by, e.g. `create_time`
    #[arg(long)]
    sort: Option<OptionKey>,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl ListArgs {
    fn into_options(self) -> FilterOptions {
        let mut options = FilterOptions::new().skip(self.skip).limit(self.limit);

        if let Some(v) = self.institution {
            options = options.institution_id(v);
        }
        if let Some(v) = self.name {
            options = options.name(v);
        }
        if let Some(v) = self.phone {
            options = options.phone(v);
        }
        if let Some(v) = self.guid {
            options = options.guid(v);
        }
        if let Some(v) = self.id_card {
            options = options.id_card(v);
        }
        if let Some(v) = self.sex {
            options = options.sex(v);
        }
        if let Some(v) = self.disable {
            options = options.disable(v);
        }
        if let Some(v) = self.status {
            options = options.status(v);
        }
        if let Some(v) = self.born_from {
            options = options.birth_date_from(v);
        }
        if let Some(v) = self.born_to {
            options = options.birth_date_to(v);
        }
        if let Some(v) = self.created_from {
            options = options.create_time_from(v);
        }
        if let Some(v) = self.created_to {
            options = options.create_time_to(v);
        }
        if let Some(v) = self.modified_from {
            options = options.last_mod_time_from(v);
        }
        if let Some(v) = self.modified_to {
            options = options.last_mod_time_to(v);
        }
        if let Some(key) = self.sort {
            options = options.sort_by(key, !self.desc);
        }
        options
    }
}

#[derive(Args)]
struct AddArgs {
    id: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    id_card: String,
    #[arg(long, default_value = "0")]
    sex: i32,
    #[arg(long)]
    birth_date: Option<NaiveDate>,
    /// Institution id, repeatable
    #[arg(long = "institution")]
    institutions: Vec<String>,
    #[arg(long, default_value = "")]
    password: String,
    #[arg(long, default_value = "0")]
    status: i32,
}

impl From<AddArgs> for User {
    fn from(args: AddArgs) -> Self {
        let mut user = User::new(args.id).with_name(args.name).with_phone(args.phone);
        user.id_card = args.id_card;
        user.sex = args.sex;
        user.birth_date = args.birth_date;
        user.institutions = args.institutions;
        user.password = args.password;
        user.status = args.status;
        user
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let json = bson::to_bson(value)?.into_relaxed_extjson();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = UserServiceConfig::from_env();
    let config = &config;
    let service = move || user_service_lib::connect(config);

    match cli.command {
        Commands::Ping => {
            user_service_lib::ping(config).await?;
        }
        Commands::Get(lookup) => {
            let service = service().await?;
            let user = if let Some(id) = lookup.id {
                service.get_user(&id).await?
            } else if let Some(token) = lookup.token {
                service.get_user_by_token(&token).await?
            } else if let Some(phone) = lookup.phone {
                service.get_user_by_phone(&phone).await?
            } else {
                return Err("one of --id, --token or --phone is required".into());
            };
            print_json(&user)?;
        }
        Commands::List(args) => {
            let page = service().await?.list_users(args.into_options()).await?;
            print_json(&page)?;
        }
        Commands::Add(args) => {
            let user = service().await?.create_user(User::from(args)).await?;
            print_json(&user)?;
        }
        Commands::Delete { id } => {
            service().await?.delete_user(&id).await?;
        }
        Commands::RotateToken { id, token } => {
            let token = service().await?.rotate_token(&id, token).await?;
            println!("{}", token);
        }
        Commands::ResetPassword { id, password } => {
            let password = service().await?.reset_password(&id, password).await?;
            println!("{}", password);
        }
        Commands::SetPhone { id, phone } => {
            service().await?.change_phone(&id, &phone).await?;
        }
    }

    Ok(())
}
