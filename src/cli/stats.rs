//! Handler for `teamex stats`.

use super::output::print_success;
use crate::app::App;
use crate::error::Result;

pub async fn execute(app: &App) -> Result<()> {
    let stats = app.query_service().get_referral_stats().await?;
    print_success(stats)
}
