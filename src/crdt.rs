use crate::Result;

/// Core trait that all CRDTs must implement.
///
/// A CRDT (Conflict-free Replicated Data Type) guarantees that concurrent
/// updates on different replicas will converge to the same state after merging,
/// without requiring coordination.
///
/// # Properties
///
/// All implementations must satisfy, compared by observable state:
/// - **Commutativity:** `a.merge(b) == b.merge(a)`
/// - **Associativity:** `a.merge(b.merge(c)) == a.merge(b).merge(c)`
/// - **Idempotency:** `a.merge(a) == a`
pub trait Crdt: Sized {
    /// Compute the least upper bound of two replica states.
    ///
    /// Merge is a pure function: it never mutates either operand and returns
    /// a freshly allocated state dominating both inputs. It fails only when
    /// the operands are structurally incompatible, such as an [`LWWESet`]
    /// with a different bias or an [`ORSet`] minted by a different tag
    /// registry.
    ///
    /// [`LWWESet`]: crate::LWWESet
    /// [`ORSet`]: crate::ORSet
    fn merge(&self, other: &Self) -> Result<Self>;
}
