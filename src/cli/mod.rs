//! CLI module for the UniVault command-line interface.
//!
//! Provides subcommands for working with a UniVault server:
//! - `login` / `logout` / `whoami` - Manage the persisted session
//! - `students list|create|import|template` - Student records and bulk import
//! - `documents list`, `users list|create`, `services list` - Browse the archive
//! - `route <path>` - Show where a navigation would land for the current session
//! - `theme` - Show or change the theme preference
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::api::{ClientError, Resource};
use crate::config::Config;
use crate::import::{self, ImportFile, ImportSession};
use crate::list::{ListController, ListState, PageNav, ResourceSource};
use crate::models::{Document, LoginRequest, NewStudent, NewUser, Role, Service, Student, User};
use crate::navigation::Navigator;
use crate::preferences::Theme;
use crate::routes::{paths, Decision};
use crate::validation::{self, FieldErrors};
use crate::AppContext;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "univault")]
#[command(author, version, about = "Client for the UniVault document archive", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "univault.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to (overrides the configuration file)
    #[arg(long, env = "UNIVAULT_API_URL")]
    pub api_url: Option<String>,

    /// Directory for the persisted session (overrides the configuration file)
    #[arg(long, env = "UNIVAULT_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and persist the session
    Login {
        #[arg(short, long)]
        email: String,
        /// Password (can also be set via UNIVAULT_PASSWORD env var)
        #[arg(short, long, env = "UNIVAULT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the persisted session
    Logout,

    /// Refresh and show the logged-in profile
    Whoami,

    /// Student management commands
    #[command(subcommand)]
    Students(StudentsCommands),

    /// Document commands
    #[command(subcommand)]
    Documents(DocumentsCommands),

    /// User management commands
    #[command(subcommand)]
    Users(UsersCommands),

    /// Service commands
    #[command(subcommand)]
    Services(ServicesCommands),

    /// Resolve a portal path against the current session
    Route {
        path: String,
    },

    /// Show or change the theme preference
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Search term (name, matricule, email...)
    #[arg(short, long)]
    pub search: Option<String>,
    /// Page to show (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: u32,
}

#[derive(Subcommand, Debug)]
pub enum StudentsCommands {
    /// List students
    List(ListArgs),
    /// Register one student
    Create {
        #[arg(long)]
        matricule: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        program: Option<String>,
    },
    /// Import students from a spreadsheet (.xlsx, .xls, .csv, .txt)
    Import {
        file: PathBuf,
    },
    /// Save the import template
    Template {
        #[arg(short, long, default_value = "students_template.csv")]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocumentsCommands {
    /// List documents
    List(ListArgs),
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List users
    List(ListArgs),
    /// Create an account
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "UNIVAULT_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        /// user, admin or super-admin
        #[arg(long, default_value = "user")]
        role: Role,
        /// Service identifier (required unless super-admin)
        #[arg(long)]
        service: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServicesCommands {
    /// List services
    List(ListArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ThemeAction {
    Light,
    Dark,
    Toggle,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli, ctx: &AppContext) -> Result<()> {
    match &cli.command {
        Commands::Login { email, password } => cmd_login(ctx, email, password).await,
        Commands::Logout => cmd_logout(ctx),
        Commands::Whoami => cmd_whoami(ctx).await,
        Commands::Students(StudentsCommands::List(args)) => {
            let path = view_path(Resource::Students, ctx.session.role());
            cmd_list::<Student>(ctx, Resource::Students, path, args, print_students).await
        }
        Commands::Students(StudentsCommands::Create {
            matricule,
            first_name,
            last_name,
            program,
        }) => {
            let student = NewStudent {
                matricule: matricule.trim().to_string(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                date_of_birth: None,
                program: program.clone(),
            };
            cmd_create_student(ctx, &student).await
        }
        Commands::Students(StudentsCommands::Import { file }) => cmd_import(ctx, file).await,
        Commands::Students(StudentsCommands::Template { output }) => {
            cmd_template(ctx, output).await
        }
        Commands::Documents(DocumentsCommands::List(args)) => {
            let path = view_path(Resource::Documents, ctx.session.role());
            cmd_list::<Document>(ctx, Resource::Documents, path, args, print_documents).await
        }
        Commands::Users(UsersCommands::List(args)) => {
            let path = view_path(Resource::Users, ctx.session.role());
            cmd_list::<User>(ctx, Resource::Users, path, args, print_users).await
        }
        Commands::Users(UsersCommands::Create {
            first_name,
            last_name,
            email,
            password,
            role,
            service,
        }) => {
            let user = NewUser {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                email: email.trim().to_string(),
                password: password.clone(),
                role: *role,
                service: service.clone(),
            };
            cmd_create_user(ctx, &user).await
        }
        Commands::Services(ServicesCommands::List(args)) => {
            let path = view_path(Resource::Services, ctx.session.role());
            cmd_list::<Service>(ctx, Resource::Services, path, args, print_services).await
        }
        Commands::Route { path } => cmd_route(ctx, path),
        Commands::Theme { action } => cmd_theme(ctx, *action),
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
    }
}

/// Portal view that backs a list command for `role`
pub fn view_path(resource: Resource, role: Option<Role>) -> &'static str {
    match (resource, role) {
        (Resource::Students, Some(Role::User)) => "/user/students",
        (Resource::Students, _) => "/admin/students",
        (Resource::Documents, Some(Role::User)) => "/user/documents",
        (Resource::Documents, _) => "/admin/documents",
        (Resource::Users, Some(Role::SuperAdmin)) => "/super-admin/users",
        (Resource::Users, _) => "/admin/users",
        (Resource::Services, _) => "/super-admin/services",
    }
}

/// Refuse to continue unless the guard renders `path`
fn require_view(ctx: &AppContext, path: &str) -> Result<()> {
    let allowed = ctx.router.resolve(path, &ctx.session.snapshot()).is_render();
    ctx.visit(path);
    if allowed {
        Ok(())
    } else {
        explain_location(ctx)
    }
}

fn explain_location(ctx: &AppContext) -> Result<()> {
    let location = ctx.history.location();
    if location == paths::LOGIN {
        anyhow::bail!("Not logged in. Run 'univault login --email <email>' first.");
    }
    if location == paths::UNAUTHORIZED {
        anyhow::bail!("Your role does not give access to this view.");
    }
    anyhow::bail!("Redirected to {}", location)
}

/// Turn a failed call into a CLI error, pointing at login when the session ended
fn call_failed(ctx: &AppContext, err: ClientError) -> anyhow::Error {
    match &err {
        ClientError::AuthExpired { .. } if ctx.history.location() == paths::LOGIN => {
            anyhow::anyhow!("{}. Run 'univault login' again.", err)
        }
        ClientError::Server(server) => {
            let fields = FieldErrors::from_server(server);
            if fields.is_empty() {
                anyhow::anyhow!("{}", server.message)
            } else {
                anyhow::anyhow!("{} ({})", server.message, fields)
            }
        }
        _ => anyhow::Error::new(err),
    }
}

async fn cmd_login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let request = LoginRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    validation::validate_login(&request)?;

    let user = ctx
        .client
        .sign_in(&request)
        .await
        .map_err(|e| call_failed(ctx, e))?;
    ctx.visit(paths::LOGIN);

    println!();
    println!("[OK] Logged in as {} ({})", user.full_name(), user.role);
    println!("Landing view: {}", ctx.history.location());
    println!();
    Ok(())
}

fn cmd_logout(ctx: &AppContext) -> Result<()> {
    ctx.client.sign_out();
    println!("[OK] Logged out.");
    Ok(())
}

async fn cmd_whoami(ctx: &AppContext) -> Result<()> {
    require_view(ctx, paths::PROFILE)?;
    let user = ctx
        .client
        .refresh_profile()
        .await
        .map_err(|e| call_failed(ctx, e))?;

    println!();
    println!("=== Profile ===");
    println!();
    println!("Name:    {}", user.full_name());
    println!("Email:   {}", user.email);
    println!("Role:    {}", user.role);
    println!(
        "Service: {}",
        user.service.as_ref().map(|s| s.label()).unwrap_or("-")
    );
    println!("Active:  {}", if user.is_active { "yes" } else { "no" });
    println!();
    Ok(())
}

/// Mount a list view, apply the requested search and page, print the result
async fn cmd_list<T>(
    ctx: &AppContext,
    resource: Resource,
    view: &str,
    args: &ListArgs,
    print: fn(&[T]),
) -> Result<()>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    require_view(ctx, view)?;

    let source = ResourceSource::<T>::new(ctx.client.clone(), resource);
    let handle = ListController::spawn(source, &ctx.config.list);
    if let Some(search) = &args.search {
        handle.search(search.clone());
    }
    let mut state = handle.settled().await;
    if args.page > 1 && state.error.is_none() {
        handle.navigate(PageNav::To(args.page));
        state = handle.settled().await;
    }

    if let Some(error) = &state.error {
        if ctx.history.location() == paths::LOGIN {
            anyhow::bail!("Session expired. Run 'univault login' again.");
        }
        anyhow::bail!("Failed to load {}: {}", resource, error);
    }

    if state.items.is_empty() {
        println!("No {} found.", resource);
        return Ok(());
    }

    println!();
    print(&state.items);
    print_footer(&state);
    Ok(())
}

fn print_footer<T>(state: &ListState<T>) {
    let controls = state.controls();
    let mut hints = Vec::new();
    if controls.previous {
        hints.push(format!("--page {}", state.page - 1));
    }
    if controls.next {
        hints.push(format!("--page {}", state.page + 1));
    }

    println!();
    println!(
        "Page {} of {} ({} total){}",
        state.page,
        state.total_pages,
        state.total,
        if hints.is_empty() {
            String::new()
        } else {
            format!("  [{}]", hints.join(", "))
        }
    );
    println!();
}

fn print_students(students: &[Student]) {
    println!(
        "{:<10}  {:<20}  {:<20}  {:<24}",
        "MATRICULE", "LAST NAME", "FIRST NAME", "PROGRAM"
    );
    println!("{}", "-".repeat(80));
    for s in students {
        println!(
            "{:<10}  {:<20}  {:<20}  {:<24}",
            s.matricule,
            truncate(&s.last_name, 20),
            truncate(&s.first_name, 20),
            truncate(s.program.as_deref().unwrap_or("-"), 24)
        );
    }
}

fn print_documents(documents: &[Document]) {
    println!(
        "{:<32}  {:<10}  {:<16}  {:<20}  {:<10}",
        "TITLE", "MATRICULE", "TYPE", "SERVICE", "ADDED"
    );
    println!("{}", "-".repeat(96));
    for d in documents {
        println!(
            "{:<32}  {:<10}  {:<16}  {:<20}  {:<10}",
            truncate(&d.title, 32),
            d.matricule,
            truncate(d.document_type.as_deref().unwrap_or("-"), 16),
            truncate(d.service.as_ref().map(|s| s.label()).unwrap_or("-"), 20),
            d.created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_users(users: &[User]) {
    println!(
        "{:<28}  {:<30}  {:<12}  {:<20}  {:<6}",
        "NAME", "EMAIL", "ROLE", "SERVICE", "ACTIVE"
    );
    println!("{}", "-".repeat(104));
    for u in users {
        println!(
            "{:<28}  {:<30}  {:<12}  {:<20}  {:<6}",
            truncate(&u.full_name(), 28),
            truncate(&u.email, 30),
            u.role,
            truncate(u.service.as_ref().map(|s| s.label()).unwrap_or("-"), 20),
            if u.is_active { "yes" } else { "no" }
        );
    }
}

fn print_services(services: &[Service]) {
    println!("{:<28}  {:<40}  {:<6}", "NAME", "DESCRIPTION", "TYPES");
    println!("{}", "-".repeat(80));
    for s in services {
        println!(
            "{:<28}  {:<40}  {:<6}",
            truncate(&s.name, 28),
            truncate(s.description.as_deref().unwrap_or("-"), 40),
            s.document_types.len()
        );
    }
}

async fn cmd_create_student(ctx: &AppContext, student: &NewStudent) -> Result<()> {
    require_view(ctx, "/admin/students")?;
    validation::validate_new_student(student)?;

    let created = ctx
        .client
        .create_student(student)
        .await
        .map_err(|e| call_failed(ctx, e))?;
    println!(
        "[OK] Student {} registered ({})",
        created.full_name(),
        created.matricule
    );
    Ok(())
}

async fn cmd_create_user(ctx: &AppContext, user: &NewUser) -> Result<()> {
    let view = view_path(Resource::Users, ctx.session.role());
    require_view(ctx, view)?;
    validation::validate_new_user(user)?;

    let created = ctx
        .client
        .create_user(user)
        .await
        .map_err(|e| call_failed(ctx, e))?;
    println!("[OK] Account created for {} ({})", created.email, created.role);
    Ok(())
}

async fn cmd_import(ctx: &AppContext, path: &Path) -> Result<()> {
    require_view(ctx, "/admin/students")?;

    let file = ImportFile::load(path, ctx.config.import.max_file_bytes).await?;
    let rows = file.count_data_rows();
    println!("Uploading {}...", file.file_name);

    let result = ctx
        .client
        .import_students(&file)
        .await
        .map_err(|e| call_failed(ctx, e))?;

    let mut view = ImportSession::new();
    view.record(result, rows);
    if let Some(result) = view.result() {
        println!();
        print!("{}", import::render(result));
        if let Some(total) = rows {
            for issue in result.check_accounting(total) {
                println!("  [!] {}", issue);
            }
        }
    }

    if view.close().refresh {
        let source = ResourceSource::<Student>::new(ctx.client.clone(), Resource::Students);
        let handle = ListController::spawn(source, &ctx.config.list);
        let state = handle.settled().await;
        println!();
        println!("Student list refreshed: {} students on record.", state.total);
    }
    println!();
    Ok(())
}

async fn cmd_template(ctx: &AppContext, output: &Path) -> Result<()> {
    let content = match ctx.client.import_template().await {
        Ok(bytes) => bytes,
        Err(e @ ClientError::AuthExpired { .. }) => return Err(call_failed(ctx, e)),
        Err(e) => {
            tracing::debug!(error = %e, "Template endpoint unavailable, using built-in template");
            import::template_csv().into_bytes()
        }
    };

    tokio::fs::write(output, content)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("[OK] Template saved to {}", output.display());
    Ok(())
}

fn cmd_route(ctx: &AppContext, path: &str) -> Result<()> {
    let decision = ctx.visit(path);
    let role = ctx
        .session
        .role()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    println!();
    println!("Session:  {}", role);
    println!("Request:  {}", path);
    match decision {
        Decision::Render(m) => {
            println!("Renders:  {} (pattern {})", ctx.history.location(), m.pattern);
            for (name, value) in &m.params {
                println!("  :{} = {}", name, value);
            }
        }
        Decision::Redirect(to) => println!("Redirect: {}", to),
    }
    println!();
    Ok(())
}

fn cmd_theme(ctx: &AppContext, action: Option<ThemeAction>) -> Result<()> {
    let current = ctx.preferences.theme();
    let next = match action {
        None => {
            println!("Theme: {}", current);
            return Ok(());
        }
        Some(ThemeAction::Light) => Theme::Light,
        Some(ThemeAction::Dark) => Theme::Dark,
        Some(ThemeAction::Toggle) => current.toggled(),
    };
    ctx.preferences
        .set_theme(next)
        .context("Failed to save theme preference")?;
    println!("[OK] Theme set to {}", next);
    Ok(())
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!();
            println!("Storage:");
            println!("  Directory:    {}", config.storage.dir.display());
            println!();
            println!("Lists:");
            println!("  Page size:    {}", config.list.page_size);
            println!("  Debounce:     {}ms", config.list.debounce_ms);
            println!();
            println!("Import:");
            println!("  Max size:     {} bytes", config.import.max_file_bytes);

            let warnings = config.validate();
            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in warnings {
                    println!("  [!] {}", warning);
                }
            }
            println!();
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            println!("Please check the configuration file syntax and try again.");
        }
    }

    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
