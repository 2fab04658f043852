//! Handlers for `teamex rates`.

use super::output::print_success;
use super::RatesCommand;
use crate::app::App;
use crate::domain::UserId;
use crate::error::Result;

pub async fn execute(app: &App, command: RatesCommand) -> Result<()> {
    let service = app.rate_service()?;
    match command {
        RatesCommand::Show => {
            let current = service.get_current().await?;
            print_success(current)
        }
        RatesCommand::Set(args) => {
            let token = app
                .admin_directory()
                .authorize(&UserId::new(args.editor.as_str()))?;
            let updated = service.update_rates(args.buy, args.sell, &token).await?;
            print_success(updated)
        }
        RatesCommand::History(args) => {
            let history = service.history(args.limit).await?;
            print_success(history)
        }
    }
}
