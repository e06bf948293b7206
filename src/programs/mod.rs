//! Factory programs.
//!
//! Each program is plain [`ProgramData`] built in code. Use these as starting
//! points for your own patches, or study them to see how the DSP blocks and
//! controllers combine into a timbre.
//!
//! # Example
//!
//! ```
//! use singularity::{programs, ProgramBank};
//!
//! let bank = ProgramBank::factory().unwrap();
//! assert!(bank.program_by_name("bell").is_some());
//!
//! let pad = programs::pad();
//! assert_eq!(pad.layers.len(), 2);
//! ```

mod bass;
mod bell;
mod lead;
mod pad;
mod pluck;

pub use bass::bass;
pub use bell::bell;
pub use lead::lead;
pub use pad::pad;
pub use pluck::pluck;

use crate::{error::PatchError, patch::ProgramBank, patch::ProgramData};

/// Factory programs with their program numbers.
pub fn all() -> Vec<(u32, ProgramData)> {
    vec![
        (0, lead()),
        (1, bass()),
        (2, bell()),
        (3, pad()),
        (4, pluck()),
    ]
}

impl ProgramBank {
    /// Bank holding every factory program.
    pub fn factory() -> Result<Self, PatchError> {
        all()
            .into_iter()
            .try_fold(ProgramBank::new("factory"), |bank, (id, program)| {
                bank.with_program(id, program)
            })
    }
}
