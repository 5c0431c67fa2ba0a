//! Status command implementation.

use crate::client::ProfileClient;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use lector_domain::ModelClient;

/// Execute the status command.
///
/// Returns whether the model backend is reachable.
pub async fn execute_status(config: &Config, api_key: Option<&str>, formatter: &Formatter) -> Result<bool> {
    let profile = config.get_active_profile()?;
    let client = ProfileClient::from_profile(profile, api_key)?;

    println!("Profile: {}", config.active_profile);
    let available = client.check_availability().await;
    println!("{}", formatter.availability(client.model(), &profile.base_url, available));

    Ok(available)
}
