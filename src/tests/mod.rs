//! End-to-end integration tests for the six scenarios of spec §8: each
//! module below builds a small, deterministic problem instance (no random
//! data generation — the matrices are chosen so the expected outcome can be
//! reasoned about directly) and drives it through [`crate::solver::PogsSolver`]
//! the same way a caller would.

mod adaptive_rho;
mod cone_lp;
mod lasso;
mod nan_detection;
mod socp;
