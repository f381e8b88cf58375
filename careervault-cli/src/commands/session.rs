use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use client::AppContext;
use rpassword::prompt_password;
use shared::models::{LoginRequest, SignupRequest, User};

use super::require_session;

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Sign in and store the session tokens
    Login(LoginArgs),
    /// Create an account and sign in with it
    Signup(SignupArgs),
    /// Sign out and forget the stored tokens
    Logout,
    /// Show the signed-in user
    Me,
    /// Renew the access token now
    Refresh,
    /// Show the backend's password rules
    Requirements,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Email or username; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(long, short)]
    pub username: String,

    #[arg(long, short)]
    pub email: String,

    #[arg(long)]
    pub given_name: Option<String>,

    #[arg(long)]
    pub family_name: Option<String>,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

pub async fn run(context: &AppContext, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Login(args) => login(context, args).await,
        SessionCommand::Signup(args) => signup(context, args).await,
        SessionCommand::Logout => logout(context).await,
        SessionCommand::Me => me(context).await,
        SessionCommand::Refresh => refresh(context).await,
        SessionCommand::Requirements => requirements(context).await,
    }
}

async fn login(context: &AppContext, args: LoginArgs) -> Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = read_password(args.password_stdin, false)?;

    let user = context
        .login(&LoginRequest::new(email, password))
        .await
        .map_err(|err| anyhow::anyhow!("login failed: {}", err.user_message()))?;
    print_user(&user);
    println!("{} job applications loaded.", context.jobs().all_jobs().len());
    Ok(())
}

async fn signup(context: &AppContext, args: SignupArgs) -> Result<()> {
    let password = read_password(args.password_stdin, true)?;
    let request = SignupRequest {
        username: args.username,
        email: args.email,
        password,
        given_name: args.given_name,
        family_name: args.family_name,
    };

    let user = context
        .signup(&request)
        .await
        .map_err(|err| anyhow::anyhow!("signup failed: {}", err.user_message()))?;
    println!("Account created.");
    print_user(&user);
    Ok(())
}

async fn logout(context: &AppContext) -> Result<()> {
    context.logout().await;
    println!("Signed out.");
    Ok(())
}

async fn me(context: &AppContext) -> Result<()> {
    require_session(context).await?;
    let Some(user) = context.session().user() else {
        bail!("session has no user profile");
    };
    print_user(&user);
    if let Some(claims) = context.api().stored_user_info() {
        if let Some(username) = claims.username {
            println!("Identity token username: {username}");
        }
    }
    Ok(())
}

async fn refresh(context: &AppContext) -> Result<()> {
    if context.api().tokens().read().is_none() {
        bail!("no active session; run `careervault session login` first");
    }
    context
        .session()
        .refresh_token()
        .await
        .map_err(|err| anyhow::anyhow!("refresh failed: {}", err.user_message()))?;
    if let Some(bundle) = context.api().tokens().read() {
        println!("Access token renewed; valid until {}.", bundle.expires_at);
    }
    Ok(())
}

async fn requirements(context: &AppContext) -> Result<()> {
    let rules = context.api().password_requirements().await?;
    println!("Minimum length: {}", rules.min_length);
    for (label, required) in [
        ("uppercase letter", rules.require_uppercase),
        ("lowercase letter", rules.require_lowercase),
        ("number", rules.require_numbers),
        ("symbol", rules.require_symbols),
    ] {
        if required {
            println!("Requires a {label}");
        }
    }
    if let Some(description) = rules.description {
        println!("{description}");
    }
    Ok(())
}

fn print_user(user: &User) {
    let name = user.display_name();
    println!("Signed in as {name} <{}>", user.email);
    if name != user.username {
        println!("Username: {}", user.username);
    }
}

fn read_password(from_stdin: bool, confirm: bool) -> Result<String> {
    let password = if from_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        let password = prompt_password("Password: ")?;
        if confirm && prompt_password("Confirm password: ")? != password {
            bail!("passwords do not match");
        }
        password
    };

    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().lock().read_line(&mut value)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        bail!("{} must not be empty", label.trim_end_matches(": ").to_lowercase());
    }
    Ok(value)
}

