use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;

/// Runtime-tunable evaluation weights, loadable from JSON via the
/// `ParamsFile` UCI option. Centipawns unless noted.
#[derive(Clone, Serialize, Deserialize)]
pub struct Params {
    pub doubled_pawn: i32,
    pub isolated_pawn: i32,
    pub backward_pawn: i32,
    pub connected_pawn: i32,
    /// Passed pawn bonus by relative rank (0..7 from the owner's side).
    pub passed_pawn: [i32; 8],
    /// Extra passed-pawn bonus when the passer is defended by a pawn.
    pub passed_connected: i32,
    /// Mop-up: weight on the losing king's distance from the centre.
    pub mopup_edge_weight: i32,
    /// Mop-up: weight on closing the distance between the kings.
    pub mopup_chase_weight: i32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            doubled_pawn: -12,
            isolated_pawn: -8,
            backward_pawn: -6,
            connected_pawn: 10,
            passed_pawn: [0, 5, 10, 20, 35, 60, 90, 0],
            passed_connected: 15,
            mopup_edge_weight: 10,
            mopup_chase_weight: 4,
        }
    }
}

lazy_static! {
    pub static ref PARAMS: RwLock<Params> = RwLock::new(Params::default());
}

pub fn load_params_from(path: &str) -> anyhow::Result<()> {
    let data = fs::read_to_string(path)?;
    let p: Params = serde_json::from_str(&data)?;
    *PARAMS.write() = p;
    Ok(())
}

pub fn save_params_to(path: &str) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(&*PARAMS.read())?;
    fs::write(path, s)?;
    Ok(())
}
