/// Application-wide numeric constants.
/// Values are expressed in surface units (CSS pixels of the puzzle area) unless noted otherwise.
/// Maximum distance between a piece position and its target that still counts as placed.
pub const POSITION_TOLERANCE: f64 = 35.0;
/// Looser positional tolerance used by some shape packs.
pub const POSITION_TOLERANCE_LOOSE: f64 = 40.0;
/// Maximum wrapped angular difference (degrees) that still counts as aligned.
pub const ROTATION_TOLERANCE_DEG: f64 = 15.0;
/// Bias added to the handle angle so a handle pointing straight up reads as 0°.
pub const HANDLE_BIAS_DEG: f64 = 90.0;
/// Side length of the square local frame every outline is drawn in.
pub const PIECE_FRAME: f64 = 100.0;
/// Where a piece lands when picked from the palette without an explicit position.
pub const BOARD_DROP_POINT: (f64, f64) = (300.0, 180.0);
/// Flat award for a first-time solve.
pub const FLAT_AWARD: u32 = 100;
/// Number of pieces in a tangram set.
pub const PIECE_COUNT: usize = 7;
/// Shape shown when a session starts.
pub const DEFAULT_SHAPE_ID: &str = "house";
