use crate::cli::actions::{server, Action};
use anyhow::Result;

/// Run whatever action the CLI front end produced. Each `Action::*`
/// variant maps to one `*::execute` call.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
    }
}
