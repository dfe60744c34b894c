//! Shopping session core
//!
//! Conversation store, agent state, wishlist/canvas synchronization, the
//! pending product proposal, and the relay that drives the remote agent.

mod proposal;
mod relay;
mod session;
mod state;
mod store;
mod sync;
mod view;

pub use proposal::{ProductProposal, ProposalChoice, ProposalPreview};
pub use relay::{ChatRelay, RelayError, RelayOutcome};
pub use session::{CanvasEdit, ProposalBusy, SharedSession, ShoppingSession};
pub use state::{AgentState, StatePatch};
pub use sync::ProposalLimits;
pub use view::View;
