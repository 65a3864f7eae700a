use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::{board::Board, Heading, Pos};

/// Rays probed from the head, in global order `[N, NE, E, SE, S, SW, W, NW]`
///
/// North is towards decreasing `y`.
pub const RAY_DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Distance at which a probed object stops contributing to its ray feature
pub const VIEW_DISTANCE: i32 = 20;

/// Divisor applied to the body length feature
pub const BODY_LENGTH_SCALE: f32 = 100.0;

/// Index of the "behind" ray once rays are in egocentric order `[F, FR, R, BR, B, BL, L, FL]`
const BEHIND: usize = 4;

/// Length of a vector-mode encoding: 7 rays, apple bearing and body length
pub const VECTOR_LEN: usize = RAY_DIRECTIONS.len() - 1 + 2;

/// How the environment presents its state to the learner
///
/// The mode is fixed for a run and also decides the action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingMode {
    /// Egocentric ray features; actions are relative turns {left, straight, right}
    Vector,
    /// A square patch of the board around the head; actions are absolute headings {N, E, S, W}
    Image,
}

impl EncodingMode {
    pub fn num_actions(self) -> usize {
        match self {
            Self::Vector => 3,
            Self::Image => 4,
        }
    }

    /// Number of scalars in one encoding given the image view radius
    pub fn input_size(self, view_radius: usize) -> usize {
        match self {
            Self::Vector => VECTOR_LEN,
            Self::Image => (2 * view_radius + 1).pow(2),
        }
    }
}

/// What the learner sees of the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateEncoding {
    /// Fixed-length feature vector
    Vector(Vec<f32>),
    /// Square patch stored row-major (`y` major, `x` minor), `side * side` cells
    Image { side: usize, cells: Vec<f32> },
}

impl StateEncoding {
    pub fn mode(&self) -> EncodingMode {
        match self {
            Self::Vector(_) => EncodingMode::Vector,
            Self::Image { .. } => EncodingMode::Image,
        }
    }

    /// The encoding flattened to a slice of scalars
    pub fn as_slice(&self) -> &[f32] {
        match self {
            Self::Vector(features) => features,
            Self::Image { cells, .. } => cells,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// Probe the 8 compass rays from `head` until each meets a non-empty cell
///
/// Each feature is `value * (1 - min(distance, 20) / 20)` where `distance` is the Chebyshev distance to the hit.
pub fn ray_features(board: &Board, head: Pos) -> [f32; 8] {
    RAY_DIRECTIONS.map(|(dx, dy)| {
        let mut step = 1;
        loop {
            let value = board.get((head.0 + dx * step, head.1 + dy * step));
            if value != 0.0 {
                let distance = step.min(VIEW_DISTANCE) as f32;
                break value * (1.0 - distance / VIEW_DISTANCE as f32);
            }
            step += 1;
        }
    })
}

/// Rotate global ray features into egocentric order `[F, FR, R, BR, BL, L, FL]`, dropping the one behind the head
pub fn egocentric(global: [f32; 8], heading: Heading) -> Vec<f32> {
    let mut local = global.to_vec();
    local.rotate_left(2 * heading as usize);
    local.remove(BEHIND);
    local
}

/// Signed bearing to the apple relative to the heading, in `(-1, 1]` where 0 is straight ahead and positive is clockwise
pub fn apple_bearing(head: Pos, apple: Pos, heading: Heading) -> f32 {
    let dx = (apple.0 - head.0) as f32;
    let dy = (head.1 - apple.1) as f32;
    // quarter turns clockwise from north, in (-2, 2]
    let global = 2.0 * dx.atan2(dy) / PI;
    let mut local = global - heading as usize as f32;
    if local <= -2.0 {
        local += 4.0;
    }
    local / 2.0
}

/// Vector-mode encoding: 7 egocentric rays, the apple bearing and the normalized body length
pub fn vector_encoding(
    board: &Board,
    head: Pos,
    heading: Heading,
    apple: Pos,
    body_len: usize,
) -> StateEncoding {
    let mut features = egocentric(ray_features(board, head), heading);
    features.push(apple_bearing(head, apple, heading));
    features.push(body_len as f32 / BODY_LENGTH_SCALE);
    StateEncoding::Vector(features)
}

/// Image-mode encoding: the `(2r + 1)²` patch of the padded board centred on the head
pub fn image_encoding(board: &Board, head: Pos, radius: usize) -> StateEncoding {
    StateEncoding::Image {
        side: 2 * radius + 1,
        cells: board.patch(head, radius),
    }
}
