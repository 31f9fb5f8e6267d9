//! File attribute bits and their compact letter form.
//!
//! Attributes follow the Windows `FILE_ATTRIBUTE_*` bit layout so the mask can
//! be handed straight to the platform calls. On other platforms the mask is
//! emulated by the attribute access layer in `rosids-ops`.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use strum::{EnumIter, IntoEnumIterator};

use crate::error::ConfigError;

/// Letters accepted by the "add attributes to copied files" option.
pub const ADDABLE_FILE_ATTRIBUTES: &str = "RASHNT";

/// Letters accepted by the "exclude files by attribute" option.
pub const EXCLUDABLE_FILE_ATTRIBUTES: &str = "RASHCNETO";

/// A single attribute that has a letter in the compact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Attribute {
    ReadOnly,
    Hidden,
    System,
    Archive,
    Temporary,
    Compressed,
    Offline,
    NotIndexed,
    Encrypted,
}

impl Attribute {
    /// The letter naming this attribute.
    pub const fn letter(self) -> char {
        match self {
            Self::ReadOnly => 'R',
            Self::Hidden => 'H',
            Self::System => 'S',
            Self::Archive => 'A',
            Self::Temporary => 'T',
            Self::Compressed => 'C',
            Self::Offline => 'O',
            Self::NotIndexed => 'N',
            Self::Encrypted => 'E',
        }
    }

    /// The bit this attribute occupies in a mask.
    pub const fn bits(self) -> u32 {
        match self {
            Self::ReadOnly => 0x1,
            Self::Hidden => 0x2,
            Self::System => 0x4,
            Self::Archive => 0x20,
            Self::Temporary => 0x100,
            Self::Compressed => 0x800,
            Self::Offline => 0x1000,
            Self::NotIndexed => 0x2000,
            Self::Encrypted => 0x4000,
        }
    }

    /// Look up an attribute by letter, ignoring case.
    pub fn from_letter(letter: char) -> Option<Self> {
        let letter = letter.to_ascii_uppercase();
        Self::iter().find(|attr| attr.letter() == letter)
    }
}

/// A set of file attribute bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AttributeMask(u32);

impl AttributeMask {
    /// The empty mask.
    pub const EMPTY: Self = Self(0);

    /// Reparse point (junction or symbolic link). Has no letter; it is only
    /// set through the junction exclusion switches.
    pub const REPARSE_POINT: Self = Self(0x400);

    /// Wrap raw attribute bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw attribute bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether any bit is shared with `other`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether the bit for `attr` is set.
    pub const fn contains(self, attr: Attribute) -> bool {
        self.0 & attr.bits() != 0
    }

    /// Return this mask with `attr` set.
    pub const fn with(self, attr: Attribute) -> Self {
        Self(self.0 | attr.bits())
    }

    /// Return this mask with `attr` cleared.
    pub const fn without(self, attr: Attribute) -> Self {
        Self(self.0 & !attr.bits())
    }

    /// Parse the compact letter form, e.g. `"RH"` for read-only + hidden.
    ///
    /// Letters are case-insensitive. Every letter must appear in `allowed`;
    /// anything else is a configuration error rather than being ignored.
    pub fn parse(value: &str, allowed: &str) -> Result<Self, ConfigError> {
        let mut mask = Self::EMPTY;
        for letter in value.chars() {
            let attr = Attribute::from_letter(letter)
                .filter(|attr| allowed.contains(attr.letter()))
                .ok_or_else(|| ConfigError::InvalidAttribute {
                    letter,
                    allowed: allowed.to_string(),
                })?;
            mask = mask.with(attr);
        }
        Ok(mask)
    }
}

impl BitOr for AttributeMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AttributeMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AttributeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attr in Attribute::iter().filter(|attr| self.contains(*attr)) {
            write!(f, "{}", attr.letter())?;
        }
        if self.intersects(Self::REPARSE_POINT) {
            write!(f, "+reparse")?;
        }
        Ok(())
    }
}
