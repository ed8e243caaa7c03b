//! OCC well transfers workbook -> `well_transfers`

use super::{unexpected_payload, Normalized, Normalizer};
use crate::dataset::{DatasetDescriptor, WELL_TRANSFERS};
use crate::error::Result;
use crate::fetch::{Payload, PayloadFormat};
use crate::row::{Row, RowBuilder};
use crate::value::{to_date, to_text, RawValue};
use tracing::debug;

const EVENT_DATE: usize = 0;
const API_NUMBER: usize = 1;

static EMPTY_CELL: RawValue = RawValue::Null;

/// Reads worksheet rows by position; column i is the descriptor's column i.
///
/// A row is kept only when both halves of its key are present: a non-blank API
/// number and an event date that converts to a calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct WellTransferNormalizer;

impl WellTransferNormalizer {
    fn transfer_row(cells: &[RawValue]) -> Option<Row> {
        let cell = |i: usize| cells.get(i).unwrap_or(&EMPTY_CELL);

        to_text(cell(API_NUMBER))?;
        to_date(cell(EVENT_DATE))?;

        let row = WELL_TRANSFERS
            .columns
            .iter()
            .enumerate()
            .fold(RowBuilder::new(&WELL_TRANSFERS), |builder, (i, column)| {
                builder.raw(column.name, cell(i))
            })
            .build();
        Some(row)
    }
}

impl Normalizer for WellTransferNormalizer {
    fn dataset(&self) -> &'static DatasetDescriptor {
        &WELL_TRANSFERS
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Workbook
    }

    fn normalize_batch(&self, payload: &Payload) -> Result<Normalized> {
        let Payload::Workbook(sheet) = payload else {
            return Err(unexpected_payload(&WELL_TRANSFERS, payload));
        };

        let rows: Vec<Row> = sheet
            .iter()
            .filter_map(|cells| Self::transfer_row(cells))
            .collect();

        debug!(records = sheet.len(), kept = rows.len(), "Normalized well transfers");

        Ok(Normalized {
            records: sheet.len(),
            rows,
        })
    }
}
