use clap::{Parser, Subcommand};
use portal_core::geolocation::{resolve_origin, FixedLocation};
use portal_core::symptoms::{Language, SymptomChecker};
use portal_core::views::{ListingStatus, Mount};
use portal_core::{
    AuthState, ClinicLocator, ConfigSources, Coordinate, Gateway, Identity, Notification,
    NotificationKind, PatientPortal, PortalConfig, ProfileField, RecordType,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Healthcare portal CLI")]
struct Cli {
    /// Signed-in identity (UUID) for portal commands
    #[arg(long, global = true, env = "PORTAL_USER_ID")]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find clinics, highest rated first
    Clinics {
        /// Search text matched against name, address and services
        #[arg(long)]
        query: Option<String>,
        /// Origin for distances as LAT,LON (overrides PORTAL_ORIGIN)
        #[arg(long, allow_hyphen_values = true)]
        origin: Option<Coordinate>,
    },
    /// Health records
    Records {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Record and profile summary
    Overview,
    /// Simulated symptom assessment
    Symptoms {
        /// Description of the symptoms
        text: String,
        /// english, kiswahili or sheng
        #[arg(long, default_value = "english")]
        language: Language,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// List records, newest first
    List,
    /// Add a record
    Add {
        /// diagnosis, medication, lab_result, vaccination, visit or allergy
        #[arg(long = "type")]
        record_type: RecordType,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Doctor's name, without the title
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long)]
        clinic: Option<String>,
        /// Date recorded (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the stored profile
    Show,
    /// Set one field; an empty value clears it
    Set {
        /// full_name, phone, date_of_birth, gender, emergency_contact_name or
        /// emergency_contact_phone
        field: ProfileField,
        value: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portal_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = PortalConfig::resolve(ConfigSources::from_env())?;

    let Some(command) = cli.command else {
        println!("No command given. Use --help to see available commands.");
        return Ok(());
    };

    let gateway = cfg.gateway().connect()?;

    match command {
        Commands::Clinics { query, origin } => {
            let origin = resolve_origin(origin.or(cfg.origin_override()), &FixedLocation(None));
            let mut locator = ClinicLocator::new(origin);
            locator.load(gateway.as_ref()).await;
            if let Some(query) = query {
                locator.set_query(query);
                locator.search();
            }
            print_notifications(locator.take_notifications());
            print_clinics(&locator);
        }
        Commands::Records { command } => {
            let mut portal = open_portal(cli.user, &cfg)?;
            match command {
                RecordCommands::List => {
                    portal.load_records(gateway.as_ref()).await;
                    print_notifications(portal.take_notifications());
                    print_records(&portal);
                }
                RecordCommands::Add {
                    record_type,
                    title,
                    description,
                    doctor,
                    clinic,
                    date,
                } => {
                    portal.open_composer();
                    let form = portal.form_mut();
                    form.record_type = record_type.as_str().into();
                    form.title = title;
                    form.description = description.unwrap_or_default();
                    form.doctor_name = doctor.unwrap_or_default();
                    form.clinic_name = clinic.unwrap_or_default();
                    if let Some(date) = date {
                        form.date_recorded = date;
                    }
                    let outcome = portal.submit_record(gateway.as_ref()).await;
                    print_notifications(portal.take_notifications());
                    outcome?;
                    print_records(&portal);
                }
            }
        }
        Commands::Profile { command } => {
            let mut portal = open_portal(cli.user, &cfg)?;
            portal.load_profile(gateway.as_ref()).await;
            match command {
                ProfileCommands::Show => {}
                ProfileCommands::Set { field, value } => {
                    let outcome = set_profile_field(&mut portal, gateway.as_ref(), field, value).await;
                    print_notifications(portal.take_notifications());
                    outcome?;
                }
            }
            print_notifications(portal.take_notifications());
            print_profile(&portal);
        }
        Commands::Overview => {
            let mut portal = open_portal(cli.user, &cfg)?;
            portal.activate(gateway.as_ref()).await;
            print_notifications(portal.take_notifications());
            let overview = portal.overview();
            println!("Total records:  {}", overview.total_records);
            println!("Recent (30 d):  {}", overview.recent_records);
            println!("Profile status: {:?}", overview.profile_status);
            match overview.empty_message {
                Some(message) => println!("{message}"),
                None => {
                    println!("Latest:");
                    for record in &overview.latest {
                        println!(
                            "  {}  {} ({})",
                            record.date_label(),
                            record.title,
                            record.record_type.label()
                        );
                    }
                }
            }
        }
        Commands::Symptoms { text, language } => {
            let checker = SymptomChecker::new(cfg.symptom_delay());
            println!("Analysing...");
            let assessment = checker.analyze(&text, language).await?;
            println!("Possible conditions:");
            for condition in &assessment.conditions {
                println!(
                    "  {:<18} {:>3}%  {:?}",
                    condition.name, condition.probability, condition.severity
                );
            }
            println!("Recommendations:");
            for recommendation in &assessment.recommendations {
                println!("  - {recommendation}");
            }
            println!("This is a simulation and not a medical diagnosis.");
        }
    }

    Ok(())
}

/// Gates portal commands on the identity given with `--user` or `PORTAL_USER_ID`.
fn open_portal(user: Option<Uuid>, cfg: &PortalConfig) -> anyhow::Result<PatientPortal> {
    let auth = match user {
        Some(id) => AuthState::SignedIn(Identity { id, email: None }),
        None => AuthState::SignedOut,
    };
    match PatientPortal::mount(&auth, cfg.sign_in_path()) {
        Mount::Ready(portal) => Ok(portal),
        Mount::Redirect(to) => {
            anyhow::bail!("not signed in: sign in at {to} and pass --user or set PORTAL_USER_ID")
        }
        Mount::Loading(message) => anyhow::bail!("{message}"),
    }
}

/// Select-style fields commit on change; text fields commit as a blur would.
async fn set_profile_field(
    portal: &mut PatientPortal,
    gateway: &dyn Gateway,
    field: ProfileField,
    value: String,
) -> anyhow::Result<()> {
    if field.commits_on_change() {
        portal.change_profile_select(gateway, field, value).await?;
    } else {
        portal.edit_profile(field, value)?;
        portal.commit_profile_field(gateway, field).await?;
    }
    Ok(())
}

fn print_notifications(notifications: Vec<Notification>) {
    for n in notifications {
        let tag = match n.kind {
            NotificationKind::Info => "info",
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        eprintln!("[{tag}] {}: {}", n.title, n.description);
    }
}

fn print_clinics(locator: &ClinicLocator) {
    if let Some((title, hint)) = locator.status().message() {
        println!("{title}");
        println!("{hint}");
        return;
    }
    if let ListingStatus::Results(count) = locator.status() {
        println!("{count} clinics");
    }
    for card in locator.cards() {
        let distance = card.distance.unwrap_or_default();
        println!("{}  [{}]  {}", card.name, card.rating, distance);
        println!("  {}", card.address);
        if !card.services.is_empty() {
            let more = card.more_services.map(|m| format!(" {m}")).unwrap_or_default();
            println!("  {}{more}", card.services.join(", "));
        }
        if let Some(phone) = card.phone {
            println!("  {phone}");
        }
    }
}

fn print_records(portal: &PatientPortal) {
    if portal.records().is_empty() {
        println!("{}", portal.overview().empty_message.unwrap_or_default());
        return;
    }
    for record in portal.records() {
        println!(
            "{}  {}  [{}]",
            record.date_label(),
            record.title,
            record.record_type.label()
        );
        if let Some(doctor) = record.doctor_label() {
            println!("  {doctor}");
        }
        if let Some(clinic) = &record.clinic_name {
            println!("  {clinic}");
        }
        if let Some(description) = &record.description {
            println!("  {description}");
        }
    }
}

fn print_profile(portal: &PatientPortal) {
    let Some(profile) = portal.profile() else {
        println!("No profile stored yet.");
        return;
    };
    println!("email: {}", profile.email.as_deref().unwrap_or_default());
    for field in ProfileField::ALL {
        println!("{field}: {}", portal.profile_value(field));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_record_add() {
        let cli = Cli::try_parse_from([
            "portal",
            "--user",
            "6f1c2a54-3b7e-4d5a-9c8f-1e2d3c4b5a69",
            "records",
            "add",
            "--type",
            "lab_result",
            "--title",
            "Malaria smear",
            "--doctor",
            "Achieng",
        ])
        .expect("arguments should parse");

        assert!(cli.user.is_some());
        match cli.command {
            Some(Commands::Records {
                command:
                    RecordCommands::Add {
                        record_type,
                        title,
                        doctor,
                        date,
                        ..
                    },
            }) => {
                assert_eq!(record_type, RecordType::LabResult);
                assert_eq!(title, "Malaria smear");
                assert_eq!(doctor.as_deref(), Some("Achieng"));
                assert_eq!(date, None);
            }
            _ => panic!("expected records add"),
        }
    }

    #[test]
    fn test_parse_clinics_origin_and_profile_field() {
        let cli = Cli::try_parse_from(["portal", "clinics", "--origin", "-4.04,39.67"])
            .expect("arguments should parse");
        match cli.command {
            Some(Commands::Clinics { origin, query }) => {
                let origin = origin.expect("origin should be set");
                assert_eq!(origin.latitude, -4.04);
                assert_eq!(query, None);
            }
            _ => panic!("expected clinics"),
        }

        let cli = Cli::try_parse_from(["portal", "profile", "set", "date-of-birth", "1990-04-12"])
            .expect("arguments should parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Profile {
                command: ProfileCommands::Set {
                    field: ProfileField::DateOfBirth,
                    ..
                }
            })
        ));

        assert!(Cli::try_parse_from(["portal", "profile", "set", "email", "x@y.z"]).is_err());
    }

    #[test]
    fn test_portal_commands_need_identity() {
        let cfg = PortalConfig::resolve(ConfigSources::default()).expect("defaults should resolve");
        let err = open_portal(None, &cfg).expect_err("no identity should fail");
        assert!(err.to_string().contains("/auth"));
        assert!(open_portal(Some(Uuid::new_v4()), &cfg).is_ok());
    }
}
