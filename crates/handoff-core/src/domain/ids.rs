//! Worker identifiers.
//!
//! Worker はストア上に状態を持たないので、ID はログとイベントで
//! 「どのインスタンスが claim したか」を区別するためだけに使います。
//!
//! ## ULID を使う理由
//! - **時刻でソート可能**: 起動順に並ぶ
//! - **分散生成可能**: 複数ホストで調整なしに生成できる

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one running Worker instance.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(Ulid);

impl WorkerId {
    /// 現在時刻ベースの新しい ID
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for WorkerId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}
