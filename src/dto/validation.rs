//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a `[col, row]` cell pair addresses the 3x3 grid.
pub fn validate_cell(cell: &[u8; 2]) -> Result<(), ValidationError> {
    if cell[0] > 2 || cell[1] > 2 {
        let mut err = ValidationError::new("cell_out_of_bounds");
        err.message = Some(
            format!(
                "cell coordinates must be in 0..=2 (got [{}, {}])",
                cell[0], cell[1]
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}
