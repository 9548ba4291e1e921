// certdesk CLI - issue, look up and validate course certificates

mod api;
mod session;
pub mod settings;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use api::{ApiClient, CertificateRecord, PublicSearch};
use certdesk_core::{CertificateDocument, CertificateForm};
use session::{SessionStore, StoredSession};

/// certdesk - course certificate issuance and validation
#[derive(Parser)]
#[command(name = "certdesk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(
        long,
        global = true,
        env = "CERTDESK_SERVER",
        default_value = "http://localhost:8080"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as an administrator
    Login {
        /// Admin email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in administrator
    Whoami,
    /// Manage the course catalogue
    Course {
        #[command(subcommand)]
        action: CourseAction,
    },
    /// Issue a certificate and save its PDF
    Issue {
        #[arg(long)]
        names: String,
        #[arg(long)]
        surnames: String,
        /// Identification document number
        #[arg(long = "id", value_name = "ID")]
        identification: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        course: String,
        /// Issue date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Directory to save the PDF in
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List issued certificates, optionally filtered
    History {
        /// Matches names, surnames, identification, course or code
        query: Option<String>,
    },
    /// Find certificates by identification number (public)
    Search {
        identification: String,
    },
    /// Check that a certificate code is genuine (public)
    Validate {
        code: String,
    },
    /// Download a certificate PDF by code
    Download {
        code: String,
        /// Directory to save the PDF in
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Show or change institution settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CourseAction {
    /// List courses
    List,
    /// Add a course
    Add { name: String },
    /// Remove a course
    Rm { name: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current settings
    Show,
    /// Change settings, e.g. `primary-color=#aa0000`
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        pairs: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let server = cli.server;

    let result = match cli.command {
        Commands::Login { email } => handle_login(&server, email),
        Commands::Logout => handle_logout(&server),
        Commands::Whoami => handle_whoami(&server),
        Commands::Course { action } => handle_course(&server, action),
        Commands::Issue {
            names,
            surnames,
            identification,
            email,
            phone,
            course,
            date,
            output_dir,
        } => {
            let form = CertificateForm {
                names,
                surnames,
                identification,
                email,
                phone,
                course,
                issue_date: date,
            };
            handle_issue(&server, form, &output_dir)
        }
        Commands::History { query } => handle_history(&server, query.as_deref()),
        Commands::Search { identification } => handle_search(&server, &identification),
        Commands::Validate { code } => handle_validate(&server, &code),
        Commands::Download { code, output_dir } => handle_download(&server, &code, &output_dir),
        Commands::Config { action } => handle_config(&server, action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Client authenticated with the stored session.
fn admin_client(server: &str) -> Result<(ApiClient, StoredSession)> {
    let session = SessionStore::default_location()?.require()?;
    if session.server.trim_end_matches('/') != server.trim_end_matches('/') {
        return Err(anyhow!(
            "Stored session is for {}, not {}. Run `certdesk login` again.",
            session.server,
            server
        ));
    }
    let client = ApiClient::new(server).with_token(&session.access_token);
    Ok((client, session))
}

fn handle_login(server: &str, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => {
            eprint!("Email: ");
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line
        }
    };
    let email = email.trim().to_string();
    if !certdesk_core::is_valid_email(&email) {
        return Err(anyhow!("Invalid email address: {}", email));
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        return Err(anyhow!("Password cannot be empty"));
    }

    let response = ApiClient::new(server).login(&email, &password)?;

    let store = SessionStore::default_location()?;
    store.save(&StoredSession {
        server: server.to_string(),
        access_token: response.access_token,
        user: response.user.clone(),
        signed_in_at: session::iso8601_now(),
    })?;

    println!(
        "{} Signed in as {}",
        "✓".green().bold(),
        response.user.username.bold()
    );
    println!("  Session stored in {}", store.path().display());
    Ok(())
}

fn handle_logout(server: &str) -> Result<()> {
    let store = SessionStore::default_location()?;
    match store.load()? {
        Some(session) => {
            ApiClient::new(server)
                .with_token(&session.access_token)
                .logout()?;
            store.clear()?;
            println!("{} Signed out", "✓".green().bold());
        }
        None => println!("{}", "Not logged in".dimmed()),
    }
    Ok(())
}

fn handle_whoami(server: &str) -> Result<()> {
    let (client, _) = admin_client(server)?;
    let user = client.session()?;
    println!("  Username: {}", user.username.bold());
    println!("  Email:    {}", user.email);
    println!("  Server:   {}", server);
    Ok(())
}

fn handle_course(server: &str, action: CourseAction) -> Result<()> {
    match action {
        CourseAction::List => {
            let courses = ApiClient::new(server).list_courses()?;
            if courses.is_empty() {
                println!("{}", "No courses yet".dimmed());
            }
            for course in courses {
                println!("  - {}", course);
            }
            Ok(())
        }
        CourseAction::Add { name } => {
            let name = certdesk_core::validate::validate_course_name(&name)?;
            let (client, _) = admin_client(server)?;
            client.add_course(&name)?;
            println!("{} Course added: {}", "✓".green().bold(), name);
            Ok(())
        }
        CourseAction::Rm { name } => {
            let (client, _) = admin_client(server)?;
            client.delete_course(name.trim())?;
            println!("{} Course removed: {}", "✓".green().bold(), name.trim());
            Ok(())
        }
    }
}

fn handle_issue(server: &str, form: CertificateForm, output_dir: &Path) -> Result<()> {
    // Reject bad input before touching the network.
    form.validate()?;
    let form = form.normalized();

    let (client, _) = admin_client(server)?;
    let issued = client.issue(&form)?;

    println!(
        "{} Certificate issued: {}",
        "✓".green().bold(),
        issued.certificate.unique_code.bold()
    );

    let download = client.download(&issued.certificate.unique_code)?;
    let path = save_pdf(
        download,
        output_dir,
        &issued.file_name,
        &issued.certificate.unique_code,
    )?;
    println!("  Saved:  {}", path.display());

    if issued.email.success {
        println!("  Email:  {}", issued.email.message.green());
    } else {
        println!("  Email:  {}", issued.email.message.yellow());
    }
    Ok(())
}

fn handle_history(server: &str, query: Option<&str>) -> Result<()> {
    let (client, _) = admin_client(server)?;
    let records = client.history(query)?;
    print_history(&records);
    Ok(())
}

fn print_history(records: &[CertificateRecord]) {
    if records.is_empty() {
        println!("{}", "No certificates found".dimmed());
        return;
    }
    for record in records {
        println!(
            "  {}  {} {}  ({})  {}  {}",
            record.unique_code.bold(),
            record.names,
            record.surnames,
            record.identification,
            record.course,
            record.issue_date.dimmed()
        );
    }
    println!();
    println!("  {} certificate(s)", records.len());
}

fn handle_search(server: &str, identification: &str) -> Result<()> {
    if identification.trim().is_empty() {
        return Err(anyhow!("Identification number is required"));
    }
    let results = ApiClient::new(server).search(identification.trim())?;
    print_public(&results);
    Ok(())
}

fn print_public(results: &PublicSearch) {
    if results.count == 0 {
        println!("{}", "No certificates found".dimmed());
        return;
    }
    for record in &results.certificates {
        println!(
            "  {}  {} {}  ({})",
            record.unique_code.bold(),
            record.names,
            record.surnames,
            record.identification
        );
        println!(
            "      {}  {}  {}",
            record.course,
            record.issue_date,
            record.institution_name.dimmed()
        );
    }
}

fn handle_validate(server: &str, code: &str) -> Result<()> {
    let code = code.trim();
    if !certdesk_core::is_valid_code(code) {
        eprintln!(
            "{} {}",
            "✗".red().bold(),
            format!("'{}' is not a certificate code", code).red()
        );
        return Err(anyhow!("Expected a code like CERT-123456-ABC123"));
    }

    let results = ApiClient::new(server).validate(code)?;
    match results.certificates.first() {
        Some(record) => {
            println!("{} {}", "✓".green().bold(), "Certificate is valid".green());
            println!();
            println!("  Holder:      {} {}", record.names, record.surnames);
            println!("  Course:      {}", record.course);
            println!("  Issued:      {}", record.issue_date);
            println!("  Institution: {}", record.institution_name);
            Ok(())
        }
        None => {
            eprintln!("{} {}", "✗".red().bold(), "No certificate with that code".red());
            Err(anyhow!("Certificate {} not found", code))
        }
    }
}

fn handle_download(server: &str, code: &str, output_dir: &Path) -> Result<()> {
    // Admins download through the authenticated route; anyone else uses
    // the public one.
    let client = match SessionStore::default_location()?.load()? {
        Some(session) if session.server.trim_end_matches('/') == server.trim_end_matches('/') => {
            ApiClient::new(server).with_token(&session.access_token)
        }
        _ => ApiClient::new(server),
    };

    let code = code.trim();
    let download = client.download(code)?;
    let file_name = download.file_name.clone();
    let path = save_pdf(download, output_dir, &file_name, code)?;
    println!("{} Saved {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Writes a downloaded PDF into `dir`.
///
/// The server-suggested name is cut down to one path component; when
/// nothing usable remains the file is named after the code.
fn save_pdf(
    download: api::Download,
    dir: &Path,
    file_name: &str,
    code: &str,
) -> Result<PathBuf> {
    if !download.bytes.starts_with(b"%PDF") {
        return Err(anyhow!("Server did not return a PDF"));
    }
    std::fs::create_dir_all(dir)?;
    let name = local_file_name(file_name, code)?;
    let document = CertificateDocument::new(download.bytes, name);
    let path = document.save(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))?;
    }

    Ok(path)
}

fn local_file_name(file_name: &str, code: &str) -> Result<String> {
    certdesk_core::safe_file_name(file_name)
        .or_else(|| certdesk_core::safe_file_name(&format!("Certificado_{}.pdf", code)))
        .ok_or_else(|| anyhow!("Cannot derive a file name for certificate '{}'", code))
}

fn handle_config(server: &str, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = ApiClient::new(server).show_config()?;
            print_config(&config);
            Ok(())
        }
        ConfigAction::Set { pairs } => {
            let update = settings::parse_settings(&pairs)?;
            let (client, _) = admin_client(server)?;
            let config = client.update_config(&update)?;
            println!("{} Settings updated", "✓".green().bold());
            println!();
            print_config(&config);
            Ok(())
        }
    }
}

fn print_config(config: &serde_json::Value) {
    for key in settings::SETTING_KEYS {
        let value = config[key].as_str().unwrap_or_default();
        let shown = if value.is_empty() {
            "(not set)".dimmed().to_string()
        } else {
            value.to_string()
        };
        println!("  {:<16} {}", key, shown);
    }
}
