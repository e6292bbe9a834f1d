use rlock_schema::{LockTarget, ResolvedPackage};

/// Sort a target's entries into canonical lock order, in place.
///
/// The order depends only on entry identity (name, then version, then
/// build, via [`ResolvedPackage::canonical_cmp`]), so any permutation of
/// the same packages yields the same sequence. This is not a topological
/// sort; dependency cycles cannot make it fail.
pub fn canonical_sort(target: &mut LockTarget) {
    target.packages.sort_by(ResolvedPackage::canonical_cmp);
}
