//! Winner export.

use crate::commands::{event_id, user_id, CmdResult, Context};
use crate::output;
use crate::{ClaimStatusArg, ExportFormat, PrizeTypeArg};
use rollcall_canonical::PrizeId;
use rollcall_core::ClaimStatus;
use rollcall_store::{
    winner_rows, AllWinners, AndFilter, ClaimStatusFilter, PrizeFilter, PrizeTypeFilter,
    UserFilter, WinnerFilter, WINNER_COLUMNS,
};
use std::io::Write;
use std::path::PathBuf;

/// Optional filters; all given filters must match.
pub struct Filters {
    pub status: Option<ClaimStatusArg>,
    pub prize: Option<String>,
    pub prize_type: Option<PrizeTypeArg>,
    pub user: Option<String>,
}

impl Filters {
    fn build(self) -> Result<Box<dyn WinnerFilter>, Box<dyn std::error::Error>> {
        let mut filters: Vec<Box<dyn WinnerFilter>> = Vec::new();
        if let Some(status) = self.status {
            let status = match status {
                ClaimStatusArg::Pending => ClaimStatus::Pending,
                ClaimStatusArg::Claimed => ClaimStatus::Claimed,
                ClaimStatusArg::Expired => ClaimStatus::Expired,
            };
            filters.push(Box::new(ClaimStatusFilter { status }));
        }
        if let Some(prize) = self.prize {
            let prize_id =
                PrizeId::parse(prize).map_err(|e| format!("Invalid prize id: {}", e))?;
            filters.push(Box::new(PrizeFilter { prize_id }));
        }
        if let Some(prize_type) = self.prize_type {
            filters.push(Box::new(PrizeTypeFilter {
                prize_type: prize_type.into(),
            }));
        }
        if let Some(user) = self.user {
            filters.push(Box::new(UserFilter {
                user_id: user_id(&user)?,
            }));
        }

        Ok(if filters.is_empty() {
            Box::new(AllWinners)
        } else {
            Box::new(AndFilter { filters })
        })
    }
}

pub fn run(
    ctx: &Context,
    event: String,
    format: ExportFormat,
    filters: Filters,
    output_path: Option<PathBuf>,
) -> CmdResult {
    let id = event_id(&event)?;
    let filter = filters.build()?;
    let event = ctx.desk()?.event(&id)?;
    let rows = winner_rows(&event, &*filter);

    let rendered = match format {
        ExportFormat::Json => output::format_json(&rows) + "\n",
        ExportFormat::Csv => {
            let mut lines = vec![output::csv_record(&WINNER_COLUMNS)];
            lines.extend(rows.iter().map(|row| output::csv_record(&row.cells())));
            lines.join("\n") + "\n"
        }
    };

    match output_path {
        Some(path) => {
            std::fs::write(&path, rendered)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            eprintln!("{} row(s) written to {}", rows.len(), path.display());
        }
        None => std::io::stdout().write_all(rendered.as_bytes())?,
    }
    Ok(())
}
