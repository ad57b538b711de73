pub mod draws;
pub mod participants;
pub mod users;
pub mod winners;

pub use draws as draw_entity;
pub use participants as participant_entity;
pub use users as user_entity;
pub use winners as winner_entity;
