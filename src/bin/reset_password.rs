use std::{io, path::Path, process::ExitCode};

use clap::Parser;
use rusqlite::Connection;

use expense_tracker::{PasswordHash, ValidatedPassword, get_user_by_username, update_password};

/// Set a new password for a registered user, prompting for it twice.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to an existing SQLite database, e.g. "expenses.db".
    #[arg(long)]
    db_path: String,

    /// The account to reset.
    #[arg(long, short)]
    username: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            print_error(&message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let db_path = Path::new(&args.db_path);
    check_db_path(db_path)?;

    let connection = Connection::open(db_path)
        .map_err(|error| format!("Could not open {}: {error}", db_path.display()))?;
    let user = get_user_by_username(&args.username, &connection)
        .map_err(|error| format!("Could not find the user \"{}\": {error}", args.username))?;
    println!("Resetting password for {} ({})", user.username, user.email);

    // Stdin closed before a password was accepted.
    let Some(password_hash) = read_new_password() else {
        return Ok(());
    };

    update_password(user.id, &password_hash, &connection)
        .map_err(|error| format!("Could not save the new password: {error}"))?;
    println!("Password updated successfully!");

    Ok(())
}

/// Refuse paths that would make SQLite create a fresh, empty database.
fn check_db_path(db_path: &Path) -> Result<(), String> {
    if db_path.extension().is_none_or(|extension| extension.is_empty()) {
        return Err("Database path must include a file extension (e.g., 'my_database.db').".into());
    }

    if !db_path.is_file() {
        return Err(format!("No database file at {}", db_path.display()));
    }

    Ok(())
}

/// Prompt until the user enters a strong password twice, or stdin closes.
fn read_new_password() -> Option<PasswordHash> {
    loop {
        println!();
        let password = prompt("Enter a new password: ")?;

        let validated = match ValidatedPassword::new(&password) {
            Ok(validated) => validated,
            Err(error) => {
                print_error(&error.to_string());
                continue;
            }
        };

        if prompt("Enter the same password again: ")? != password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(&format!("Could not hash password: {error}. Try again.")),
        }
    }
}

/// Read a password without echoing it. `None` on EOF or a read error.
fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(&format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

/// Print `message` to stderr in bold red, starting with a capital letter.
fn print_error(message: &str) {
    let mut chars = message.chars();
    let message: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    eprintln!("\x1b[31;1m{message}\x1b[0m");
}
