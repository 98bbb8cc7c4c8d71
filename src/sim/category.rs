//! Body categories and contact pairs
//!
//! Each simulated body carries one category. The physics adapter registers
//! bodies with [`Category::bits`] and [`Category::contact_test_mask`], and
//! reports contacts back as a pair of categories plus body references.

use serde::{Deserialize, Serialize};

/// Game role of a simulated body.
///
/// Declaration order is the canonical contact order: the lower category is
/// always matched first, so `Ball` leads every ball contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Ball,
    Paddle,
    Block,
    Border,
    Bottom,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Ball,
        Category::Paddle,
        Category::Block,
        Category::Border,
        Category::Bottom,
    ];

    /// Physics category bitmask
    pub const fn bits(self) -> u32 {
        match self {
            Category::Ball => 0x1,
            Category::Bottom => 0x1 << 1,
            Category::Block => 0x1 << 2,
            Category::Paddle => 0x1 << 3,
            Category::Border => 0x1 << 4,
        }
    }

    /// Categories this body wants contact notifications for
    pub const fn contact_test_mask(self) -> u32 {
        match self {
            Category::Ball => {
                Category::Bottom.bits()
                    | Category::Block.bits()
                    | Category::Paddle.bits()
                    | Category::Border.bits()
            }
            _ => 0,
        }
    }

    /// Scene node name for bodies of this category
    pub const fn node_name(self) -> &'static str {
        match self {
            Category::Ball => "ball",
            Category::Paddle => "paddle",
            Category::Block => "block",
            Category::Border => "border",
            Category::Bottom => "bottom",
        }
    }

    /// Map a raw category mask back to a category (exactly one bit must match)
    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.bits() == bits)
    }
}

/// Opaque reference to a simulated body, assigned by the shell.
///
/// Block bodies use their block id so the resolver can find them in the
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyRef(pub u32);

/// One contact notification from the physics provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub category_a: Category,
    pub category_b: Category,
    pub body_a: BodyRef,
    pub body_b: BodyRef,
}

impl Contact {
    pub fn new(category_a: Category, body_a: BodyRef, category_b: Category, body_b: BodyRef) -> Self {
        Self {
            category_a,
            category_b,
            body_a,
            body_b,
        }
    }

    /// Build a contact from raw physics masks. Unknown masks yield `None`.
    pub fn from_bits(bits_a: u32, body_a: BodyRef, bits_b: u32, body_b: BodyRef) -> Option<Self> {
        let category_a = Category::from_bits(bits_a)?;
        let category_b = Category::from_bits(bits_b)?;
        Some(Self::new(category_a, body_a, category_b, body_b))
    }

    /// Reorder so the lower category comes first, keeping bodies paired
    /// with their categories.
    pub fn canonical(self) -> Self {
        if self.category_a <= self.category_b {
            self
        } else {
            Self {
                category_a: self.category_b,
                category_b: self.category_a,
                body_a: self.body_b,
                body_b: self.body_a,
            }
        }
    }

    /// Rule this contact selects, if any
    pub fn kind(&self) -> ContactKind {
        let c = self.canonical();
        match (c.category_a, c.category_b) {
            (Category::Ball, Category::Bottom) => ContactKind::BallBottom,
            (Category::Ball, Category::Border) => ContactKind::BallBorder,
            (Category::Ball, Category::Paddle) => ContactKind::BallPaddle,
            (Category::Ball, Category::Block) => ContactKind::BallBlock(c.body_b),
            _ => ContactKind::Unknown,
        }
    }
}

/// Collision rule selected by a contact's category pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    BallBottom,
    BallBorder,
    BallPaddle,
    /// Carries the block body that was struck
    BallBlock(BodyRef),
    Unknown,
}

impl ContactKind {
    /// Resolution priority within one physics step (lower resolves first).
    ///
    /// Block damage resolves before bounces and ball loss so that clearing
    /// the last block ends the level as a win even when the ball also
    /// reached the bottom during the same step.
    pub fn priority(&self) -> u8 {
        match self {
            ContactKind::BallBlock(_) => 0,
            ContactKind::BallPaddle | ContactKind::BallBorder => 1,
            ContactKind::BallBottom => 2,
            ContactKind::Unknown => 3,
        }
    }
}
