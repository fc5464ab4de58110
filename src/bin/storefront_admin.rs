//! Prints the SQL that provisions admin accounts.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use simuhub_storefront::auth::{self, MIN_PASSWORD_LEN};

#[derive(Parser)]
#[command(name = "storefront-admin", about = "Manage storefront admin accounts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print an INSERT for a new admin account.
    Create { username: String, password: String },
    /// Print an UPDATE that replaces an admin's password.
    HashPassword {
        password: String,
        #[arg(long, default_value = "admin")]
        username: String,
    },
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {MIN_PASSWORD_LEN} characters long");
    }
    Ok(())
}

fn insert_sql(username: &str, hash: &str) -> String {
    format!(
        "INSERT INTO admins (username, password_hash, role)\nVALUES ({}, {}, 'owner');",
        quote(username),
        quote(hash)
    )
}

fn update_sql(username: &str, hash: &str) -> String {
    format!(
        "UPDATE admins SET password_hash = {} WHERE username = {};",
        quote(hash),
        quote(username)
    )
}

fn main() -> Result<()> {
    let sql = match Cli::parse().command {
        Command::Create { username, password } => {
            check_password(&password)?;
            insert_sql(username.trim(), &auth::hash_password(&password)?)
        }
        Command::HashPassword { password, username } => {
            check_password(&password)?;
            update_sql(username.trim(), &auth::hash_password(&password)?)
        }
    };

    println!("{sql}");
    Ok(())
}
