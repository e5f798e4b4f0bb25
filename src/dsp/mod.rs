/// Signal conditioning blocks.
///
/// Each tick, one 128-sample I/Q block pair flows through the blocks of this
/// module in a fixed order:
///
/// ```text
/// I/Q blocks → DelayCompensator → ImbalanceDetector → ModeStateMachine → ChannelSwap → downstream
///                    ↓                    ↓                   ↓                ↓
///              one-sample shift     image-line ratio     mode hysteresis     I ↔ Q
/// ```
///
/// The compensator always applies the mode that was active when the tick
/// started; the state machine only changes it afterwards, for the next tick.
///
/// # Modules
///
/// - [`delay`]: one-sample shift with a carry register across blocks
/// - [`imbalance`]: spectral peak-to-image ratio measurement
/// - [`mode`]: correction mode and its hysteresis state machine
/// - [`swap`]: I/Q channel exchange
/// - [`transform`]: length-128 complex forward FFTs
///
/// # Thread Safety
///
/// Blocks keep state between ticks and are driven through `&mut self`. Use one
/// instance per stream.
pub mod delay;
pub mod imbalance;
pub mod mode;
pub mod swap;
pub mod transform;
