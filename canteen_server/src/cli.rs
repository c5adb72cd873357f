use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets are deliberately left off this list
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "CANTEEN_HOST",
        "CANTEEN_PORT",
        "CANTEEN_DATABASE_URL",
        "CANTEEN_STORE_TIMEOUT_SECS",
        "CANTEEN_GATEWAY_TIMEOUT_SECS",
        "CANTEEN_RAZORPAY_KEY_ID",
        "CANTEEN_RAZORPAY_API_URL",
        "CANTEEN_ALLOW_UNPAID_DELIVERY",
        "CANTEEN_USE_X_FORWARDED_FOR",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
