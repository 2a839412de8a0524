use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

use spotify_activity::auth::{AuthCodeFlow, ClientCredentials, DEFAULT_REDIRECT_URI, REQUIRED_SCOPES};
use spotify_activity::config::DEFAULT_TIMEOUT_SECS;
use spotify_activity::logging;

static RULE: &str = "------------------------------------------------------------";

static NEXT_STEPS: [&str; 3] = [
    "Copy the refresh token above",
    "Update SPOTIFY_REFRESH_TOKEN in your .env file",
    "If the workflow runs on GitHub Actions, update the SPOTIFY_REFRESH_TOKEN secret too",
];

fn step(title: &str) {
    println!("\n{RULE}\n{title}\n{RULE}\n");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init();

    println!("Spotify refresh token helper");
    println!(
        "Grants the scopes \x1b[36m{}\x1b[39m\n",
        REQUIRED_SCOPES.join(" ")
    );

    let client_id: String = Input::new()
        .with_prompt("Spotify client ID")
        .interact_text()?;
    let client_secret: String = Password::new()
        .with_prompt("Spotify client secret (hidden)")
        .interact()?;
    let redirect_uri: String = Input::new()
        .with_prompt("Redirect URI")
        .default(DEFAULT_REDIRECT_URI.to_string())
        .interact_text()?;

    let flow = AuthCodeFlow::new(ClientCredentials::new(&client_id, &client_secret), &redirect_uri);

    step("Step 1: authorize the app");
    let url = flow.authorization_url()?;
    println!("Open this URL, log in to Spotify and accept the permissions:\n\n{url}\n");
    if Confirm::new()
        .with_prompt("Open it in the default browser?")
        .default(true)
        .interact()?
    {
        if let Err(err) = open::that(&url) {
            log::warn!("could not open a browser: {err}");
        }
    }

    step("Step 2: paste the redirect URL");
    println!(
        "After approving you are redirected to something like \x1b[33m{}?code=AQBx...\x1b[39m",
        flow.redirect_uri()
    );
    let redirected: String = Input::new()
        .with_prompt("Redirected URL")
        .interact_text()?;
    let code = flow.parse_redirect(&redirected)?;
    println!("Got an authorization code: {}...", code.chars().take(20).collect::<String>());

    step("Step 3: request the tokens");
    let client = spotify_activity::http_client(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
    let token = flow.request_token(&client, &code).await?;

    println!("Refresh token:\n\n{}\n", token.refresh_token.as_deref().unwrap_or_default());
    for (i, next) in NEXT_STEPS.iter().enumerate() {
        println!("{}. {next}", i + 1);
    }
    println!("\n\x1b[33;1mWARNING\x1b[39m the refresh token is a secret, do not share it\x1b[22m\n");

    if let Some(scope) = &token.scope {
        println!("Granted scopes: {scope}");
    }
    let missing = token.missing_scopes();
    match missing.is_empty() {
        true => println!("All required scopes were granted"),
        false => println!("\x1b[33mMissing scopes:\x1b[39m {}", missing.join(", ")),
    }
    Ok(())
}
