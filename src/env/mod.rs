mod board;
mod encoding;
mod snake;

pub use board::{Board, APPLE, EMPTY, OBSTACLE};
pub use encoding::{
    apple_bearing, egocentric, image_encoding, ray_features, vector_encoding, EncodingMode,
    StateEncoding, BODY_LENGTH_SCALE, RAY_DIRECTIONS, VECTOR_LEN, VIEW_DISTANCE,
};
pub use snake::{Heading, Pos, SnakeEnv, APPLE_REWARD, APPROACH_REWARD, DEATH_REWARD};
