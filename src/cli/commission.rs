//! Handlers for `teamex commission`.

use rust_decimal::Decimal;
use serde::Serialize;

use super::output::{print_failure, print_success};
use super::CommissionCommand;
use crate::app::App;
use crate::domain::{CommissionEntry, TransactionId, UserId};
use crate::error::Result;

#[derive(Serialize)]
struct LedgerView {
    commissions: Vec<CommissionEntry>,
    total_commissions: Decimal,
}

pub async fn execute(app: &App, command: CommissionCommand) -> Result<()> {
    match command {
        CommissionCommand::Distribute(args) => {
            let distributor = app.commission_distributor()?;
            let outcome = distributor
                .distribute(
                    &UserId::new(args.user),
                    args.amount,
                    args.operation,
                    args.tx.map(TransactionId::from),
                )
                .await?;
            match outcome {
                Some(outcome) => print_success(outcome),
                None => {
                    print_failure("nothing distributed: amount and user id must be present");
                    Ok(())
                }
            }
        }
        CommissionCommand::Ledger { user } => {
            let user = UserId::new(user);
            let query = app.query_service();
            let view = LedgerView {
                commissions: query.get_user_commissions(&user).await?,
                total_commissions: query.get_total_commissions(&user).await?,
            };
            print_success(view)
        }
    }
}
