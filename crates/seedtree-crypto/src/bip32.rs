use core::fmt;
use core::num::NonZeroUsize;

use seedtree_primitives::hmac_sha512;
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::curve::{CompressPoint, Curve, Secp256k1};
use crate::error::{KeyTreeError, Result};
use crate::keys::{ChainCode, Fingerprint, PublicKey, SecretKey};
use crate::path::{ChildIndex, DerivationPath};

/// HMAC key for master key generation.
pub const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// A node of the key tree: key material, chain code and its position metadata.
#[derive(Clone)]
pub struct ExtendedKey {
    private_key: Option<SecretKey>,
    public_key: PublicKey,
    chain_code: ChainCode,
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_index: ChildIndex,
}

fn split_hmac(i: &[u8; 64]) -> (Zeroizing<[u8; 32]>, ChainCode) {
    let mut left = Zeroizing::new([0u8; 32]);
    left.copy_from_slice(&i[..32]);
    let mut right = [0u8; 32];
    right.copy_from_slice(&i[32..]);
    (left, ChainCode::new(right))
}

pub fn derive_master_key(seed: &[u8]) -> Result<ExtendedKey> {
    derive_master_key_with(&Secp256k1, seed)
}

/// BIP32 master key: `I = HMAC-SHA512("Bitcoin seed", seed)`, `IL` is the key, `IR` the chain code.
///
/// An out-of-range `IL` rejects the seed outright; unlike child derivation there is no retry.
pub fn derive_master_key_with<C: CompressPoint>(curve: &C, seed: &[u8]) -> Result<ExtendedKey> {
    let i = Zeroizing::new(hmac_sha512(MASTER_HMAC_KEY, seed));
    master_from_hmac(curve, &i)
}

fn master_from_hmac<C: CompressPoint>(curve: &C, i: &[u8; 64]) -> Result<ExtendedKey> {
    let (left, chain_code) = split_hmac(i);
    let private_key =
        SecretKey::from_bytes(&left[..]).map_err(|_| KeyTreeError::InvalidMasterKey)?;
    let public_key = curve.public_key(&private_key)?;
    debug!(
        fingerprint = %hex::encode(public_key.fingerprint()),
        "derived master key"
    );
    Ok(ExtendedKey {
        private_key: Some(private_key),
        public_key,
        chain_code,
        depth: 0,
        parent_fingerprint: [0u8; 4],
        child_index: ChildIndex::from_raw(0),
    })
}

impl ExtendedKey {
    pub fn private_key(&self) -> Option<&SecretKey> {
        self.private_key.as_ref()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    pub fn child_index(&self) -> ChildIndex {
        self.child_index
    }

    pub fn is_private(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.public_key.fingerprint()
    }

    /// The same node without its private key.
    pub fn neuter(&self) -> ExtendedKey {
        ExtendedKey {
            private_key: None,
            ..self.clone()
        }
    }

    pub fn derive_child(&self, index: ChildIndex) -> Result<ExtendedKey> {
        self.derive_child_with(&Secp256k1, index)
    }

    /// BIP32 CKDpriv for private nodes, CKDpub for public ones.
    ///
    /// When `index` yields an invalid key (`IL >= n`, a zero scalar or the point at
    /// infinity) the next index of the same kind is used instead; the returned node
    /// records the index actually used.
    pub fn derive_child_with<C: Curve>(&self, curve: &C, index: ChildIndex) -> Result<ExtendedKey> {
        let depth = self.depth.checked_add(1).ok_or(KeyTreeError::DepthOverflow)?;
        let mut candidate = index;
        loop {
            if let Some(child) = self.try_derive_child(curve, candidate, depth)? {
                trace!(depth, index = %candidate, "derived child");
                return Ok(child);
            }
            warn!(depth, index = %candidate, "child index yields an invalid key, skipping");
            candidate = candidate
                .next()
                .ok_or(KeyTreeError::InvalidChildIndex(index.raw()))?;
        }
    }

    fn try_derive_child<C: Curve>(
        &self,
        curve: &C,
        index: ChildIndex,
        depth: u8,
    ) -> Result<Option<ExtendedKey>> {
        let mut data = Zeroizing::new(Vec::with_capacity(37));
        if index.is_hardened() {
            let private_key = self
                .private_key
                .as_ref()
                .ok_or(KeyTreeError::HardenedFromPublic(index.raw()))?;
            data.push(0x00);
            data.extend_from_slice(private_key.as_bytes());
        } else {
            data.extend_from_slice(self.public_key.as_bytes());
        }
        data.extend_from_slice(&index.raw().to_be_bytes());

        let i = Zeroizing::new(hmac_sha512(self.chain_code.as_bytes(), &data));
        let (left, chain_code) = split_hmac(&i);

        let (private_key, public_key) = match &self.private_key {
            Some(parent) => match curve.add_secret(parent, &left) {
                Some(child) => {
                    let public_key = curve.public_key(&child)?;
                    (Some(child), public_key)
                }
                None => return Ok(None),
            },
            None => match curve.add_point(&self.public_key, &left)? {
                Some(public_key) => (None, public_key),
                None => return Ok(None),
            },
        };

        Ok(Some(ExtendedKey {
            private_key,
            public_key,
            chain_code,
            depth,
            parent_fingerprint: self.fingerprint(),
            child_index: index,
        }))
    }

    /// Left fold of [`ExtendedKey::derive_child`] over the path.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<ExtendedKey> {
        self.derive_path_with(&Secp256k1, path)
    }

    pub fn derive_path_with<C: Curve>(&self, curve: &C, path: &DerivationPath) -> Result<ExtendedKey> {
        path.iter()
            .try_fold(self.clone(), |node, index| node.derive_child_with(curve, *index))
    }

    pub fn derive_children<I>(&self, indices: I) -> Result<Vec<ExtendedKey>>
    where
        I: IntoIterator<Item = ChildIndex>,
    {
        self.derive_children_with(&Secp256k1, indices)
    }

    /// Derive several siblings on at most `available_parallelism` scoped workers.
    ///
    /// Each worker takes one contiguous group of indices; results come back in input
    /// order, one node per requested index.
    pub fn derive_children_with<C, I>(&self, curve: &C, indices: I) -> Result<Vec<ExtendedKey>>
    where
        C: Curve + Sync,
        I: IntoIterator<Item = ChildIndex>,
    {
        let indices: Vec<ChildIndex> = indices.into_iter().collect();
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        let workers = std::thread::available_parallelism()
            .map_or(1, NonZeroUsize::get)
            .min(indices.len());
        let group_len = indices.len().div_ceil(workers);
        debug!(siblings = indices.len(), workers, "deriving siblings");

        std::thread::scope(|scope| {
            let handles = indices
                .chunks(group_len)
                .map(|group| {
                    std::thread::Builder::new()
                        .name("seedtree-ckd".to_string())
                        .spawn_scoped(scope, move || {
                            group
                                .iter()
                                .map(|index| self.derive_child_with(curve, *index))
                                .collect::<Result<Vec<_>>>()
                        })
                        .map_err(KeyTreeError::WorkerSpawn)
                })
                .collect::<Result<Vec<_>>>()?;

            let mut children = Vec::with_capacity(indices.len());
            for handle in handles {
                let group = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
                children.extend(group);
            }
            Ok(children)
        })
    }

    /// `count` usable children starting at `start`, in index order.
    ///
    /// An index that yields an invalid key is left out of the run rather than
    /// repeated, so every returned node has a distinct child index.
    pub fn derive_run(&self, start: ChildIndex, count: u32) -> Result<Vec<ExtendedKey>> {
        self.derive_run_with(&Secp256k1, start, count)
    }

    pub fn derive_run_with<C: Curve + Sync>(
        &self,
        curve: &C,
        start: ChildIndex,
        count: u32,
    ) -> Result<Vec<ExtendedKey>> {
        let count = count as usize;
        let indices: Vec<ChildIndex> = core::iter::successors(Some(start), |index| index.next())
            .take(count)
            .collect();
        if indices.len() < count {
            return Err(KeyTreeError::InvalidChildIndex(start.raw()));
        }

        // a skipped index resolves to the same node as its successor
        let mut children = self.derive_children_with(curve, indices)?;
        children.dedup_by_key(|child| child.child_index());
        while children.len() < count {
            let after = children
                .last()
                .and_then(|child| child.child_index().next())
                .ok_or(KeyTreeError::InvalidChildIndex(start.raw()))?;
            children.push(self.derive_child_with(curve, after)?);
        }
        Ok(children)
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("private", &self.is_private())
            .field("public_key", &self.public_key)
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_index", &format_args!("{}", self.child_index))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::curve::ScalarMul;

    fn vector1_master() -> ExtendedKey {
        derive_master_key(&hex::decode("000102030405060708090a0b0c0d0e0f").unwrap()).unwrap()
    }

    fn hardened(i: u32) -> ChildIndex {
        ChildIndex::hardened(i).unwrap()
    }

    fn normal(i: u32) -> ChildIndex {
        ChildIndex::normal(i).unwrap()
    }

    #[test]
    fn test_master_key_vector1() {
        let master = vector1_master();
        assert_eq!(
            master.private_key().unwrap().to_hex(),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            master.chain_code().to_hex(),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(
            master.public_key().to_hex(),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );
        assert_eq!(hex::encode(master.fingerprint()), "3442193e");
        assert_eq!(master.depth(), 0);
        assert_eq!(master.parent_fingerprint(), [0u8; 4]);
    }

    #[test]
    fn test_child_keys_vector1() {
        let master = vector1_master();

        let m0h = master.derive_child(hardened(0)).unwrap();
        assert_eq!(
            m0h.private_key().unwrap().to_hex(),
            "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea"
        );
        assert_eq!(
            m0h.chain_code().to_hex(),
            "47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141"
        );
        assert_eq!(hex::encode(m0h.parent_fingerprint()), "3442193e");
        assert_eq!(m0h.depth(), 1);

        let m0h1 = m0h.derive_child(normal(1)).unwrap();
        assert_eq!(
            m0h1.private_key().unwrap().to_hex(),
            "3c6cb8d0f6a264c91ea8b5030fadaa8e538b020f0a387421a12de9319dc93368"
        );
        assert_eq!(
            m0h1.public_key().to_hex(),
            "03501e454bf00751f24b1b489aa925215d66af2234e3891c3b21a52bedb3cd711c"
        );

        let path: DerivationPath = "m/0'/1/2'/2".parse().unwrap();
        let leaf = master.derive_path(&path).unwrap();
        assert_eq!(
            leaf.private_key().unwrap().to_hex(),
            "0f479245fb19a38a1954c5c7c0ebab2f9bdfd96a17563ef28a6a4b1a2a764ef4"
        );
        assert_eq!(
            leaf.chain_code().to_hex(),
            "cfb71883f01676f587d023cc53a35bc7f88f724b1f8c2892ac1275ac822a3edd"
        );
        assert_eq!(leaf.depth(), 4);
        assert_eq!(leaf.child_index(), normal(2));
    }

    #[test]
    fn test_fold_matches_stepwise_derivation() {
        let master = vector1_master();
        let path: DerivationPath = "m/44'/0'/0'/0/4".parse().unwrap();
        let folded = master.derive_path(&path).unwrap();

        let mut node = master.clone();
        for index in &path {
            node = node.derive_child(*index).unwrap();
        }
        assert_eq!(folded.private_key(), node.private_key());
        assert_eq!(folded.chain_code(), node.chain_code());
        assert!(master.derive_path(&DerivationPath::master()).unwrap().private_key() == master.private_key());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let master = vector1_master();
        let a = master.derive_child(normal(7)).unwrap();
        let b = master.derive_child(normal(7)).unwrap();
        assert_eq!(a.private_key(), b.private_key());
        assert_eq!(a.chain_code(), b.chain_code());
    }

    #[test]
    fn test_hardened_and_normal_differ() {
        let master = vector1_master();
        let n = master.derive_child(normal(0)).unwrap();
        let h = master.derive_child(hardened(0)).unwrap();
        assert_ne!(n.private_key(), h.private_key());
        assert_ne!(n.chain_code(), h.chain_code());
        assert_ne!(n.public_key(), h.public_key());
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let account = vector1_master().derive_child(hardened(0)).unwrap();
        let private_child = account.derive_child(normal(5)).unwrap();
        let public_child = account.neuter().derive_child(normal(5)).unwrap();
        assert!(!public_child.is_private());
        assert_eq!(public_child.public_key(), private_child.public_key());
        assert_eq!(public_child.chain_code(), private_child.chain_code());
        assert_eq!(public_child.parent_fingerprint(), private_child.parent_fingerprint());
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let public = vector1_master().neuter();
        assert!(matches!(
            public.derive_child(hardened(1)),
            Err(KeyTreeError::HardenedFromPublic(i)) if i == hardened(1).raw()
        ));
    }

    #[test]
    fn test_parallel_children_match_sequential() {
        let account = vector1_master()
            .derive_path(&DerivationPath::bip44(0, 0, 0).unwrap())
            .unwrap();
        let children = account.derive_children((0..5).map(ChildIndex::from_raw)).unwrap();
        assert_eq!(children.len(), 5);
        for (i, child) in children.iter().enumerate() {
            let expected = account.derive_child(normal(i as u32)).unwrap();
            assert_eq!(child.child_index(), normal(i as u32));
            assert_eq!(child.private_key(), expected.private_key());
        }
    }

    /// Rejects the first `rejections` tweaks, then defers to secp256k1.
    struct Rejecting {
        rejections: Cell<u32>,
    }

    impl ScalarMul for Rejecting {
        fn add_secret(&self, secret: &SecretKey, tweak: &[u8; 32]) -> Option<SecretKey> {
            if self.rejections.get() > 0 {
                self.rejections.set(self.rejections.get() - 1);
                return None;
            }
            Secp256k1.add_secret(secret, tweak)
        }

        fn add_point(&self, point: &PublicKey, tweak: &[u8; 32]) -> Result<Option<PublicKey>> {
            if self.rejections.get() > 0 {
                self.rejections.set(self.rejections.get() - 1);
                return Ok(None);
            }
            Secp256k1.add_point(point, tweak)
        }
    }

    impl CompressPoint for Rejecting {
        fn public_key(&self, secret: &SecretKey) -> Result<PublicKey> {
            Secp256k1.public_key(secret)
        }
    }

    #[test]
    fn test_invalid_child_retries_next_index() {
        let master = vector1_master();
        let curve = Rejecting {
            rejections: Cell::new(1),
        };
        let child = master.derive_child_with(&curve, normal(3)).unwrap();
        let expected = master.derive_child(normal(4)).unwrap();
        assert_eq!(child.child_index(), normal(4));
        assert_eq!(child.private_key(), expected.private_key());

        let curve = Rejecting {
            rejections: Cell::new(2),
        };
        let public = master.neuter();
        let child = public.derive_child_with(&curve, normal(0)).unwrap();
        assert_eq!(child.child_index(), normal(2));
        assert_eq!(child.public_key(), expected_public(&master, 2).public_key());
    }

    fn expected_public(master: &ExtendedKey, i: u32) -> ExtendedKey {
        master.derive_child(normal(i)).unwrap().neuter()
    }

    #[test]
    fn test_retry_does_not_cross_hardened_boundary() {
        let master = vector1_master();
        let curve = Rejecting {
            rejections: Cell::new(1),
        };
        let last = ChildIndex::from_raw(crate::path::HARDENED_BIT - 1);
        assert!(matches!(
            master.derive_child_with(&curve, last),
            Err(KeyTreeError::InvalidChildIndex(i)) if i == last.raw()
        ));
    }

    #[test]
    fn test_depth_overflow() {
        let mut node = vector1_master();
        node.depth = u8::MAX;
        assert!(matches!(
            node.derive_child(normal(0)),
            Err(KeyTreeError::DepthOverflow)
        ));
    }

    fn hmac_with_left(left: [u8; 32]) -> [u8; 64] {
        let mut i = [0x5au8; 64];
        i[..32].copy_from_slice(&left);
        i
    }

    #[test]
    fn test_master_key_out_of_range() {
        assert!(matches!(
            master_from_hmac(&Secp256k1, &hmac_with_left([0u8; 32])),
            Err(KeyTreeError::InvalidMasterKey)
        ));

        let order: [u8; 32] =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
                .unwrap()
                .try_into()
                .unwrap();
        assert!(matches!(
            master_from_hmac(&Secp256k1, &hmac_with_left(order)),
            Err(KeyTreeError::InvalidMasterKey)
        ));

        let mut below_order = order;
        below_order[31] -= 1;
        let master = master_from_hmac(&Secp256k1, &hmac_with_left(below_order)).unwrap();
        assert_eq!(master.private_key().unwrap().as_bytes(), &below_order);
        assert_eq!(master.chain_code().as_bytes(), &[0x5au8; 32]);
    }

    #[test]
    fn test_more_siblings_than_workers() {
        let account = vector1_master().derive_child(hardened(0)).unwrap();
        let workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let count = (workers * 3 + 1) as u32;

        let children = account.derive_children((0..count).map(normal)).unwrap();
        assert_eq!(children.len(), count as usize);
        for (i, child) in children.iter().enumerate() {
            let expected = account.derive_child(normal(i as u32)).unwrap();
            assert_eq!(child.child_index(), normal(i as u32));
            assert_eq!(child.public_key(), expected.public_key());
        }
        assert!(account.derive_children(Vec::<ChildIndex>::new()).unwrap().is_empty());
    }

    /// Rejects one tweak, as if that index produced `IL >= n`.
    struct RejectTweak([u8; 32]);

    impl ScalarMul for RejectTweak {
        fn add_secret(&self, secret: &SecretKey, tweak: &[u8; 32]) -> Option<SecretKey> {
            if tweak == &self.0 {
                return None;
            }
            Secp256k1.add_secret(secret, tweak)
        }

        fn add_point(&self, point: &PublicKey, tweak: &[u8; 32]) -> Result<Option<PublicKey>> {
            if tweak == &self.0 {
                return Ok(None);
            }
            Secp256k1.add_point(point, tweak)
        }
    }

    impl CompressPoint for RejectTweak {
        fn public_key(&self, secret: &SecretKey) -> Result<PublicKey> {
            Secp256k1.public_key(secret)
        }
    }

    fn normal_tweak(parent: &ExtendedKey, index: ChildIndex) -> [u8; 32] {
        let mut data = parent.public_key().as_bytes().to_vec();
        data.extend_from_slice(&index.raw().to_be_bytes());
        hmac_sha512(parent.chain_code().as_bytes(), &data)[..32]
            .try_into()
            .unwrap()
    }

    #[test]
    fn test_run_skips_invalid_index() {
        let account = vector1_master().derive_child(hardened(0)).unwrap();
        let curve = RejectTweak(normal_tweak(&account, normal(2)));

        // per-index derivation resolves 2 to 3, so the sibling list repeats a node
        let siblings = account
            .derive_children_with(&curve, (0..5).map(normal))
            .unwrap();
        assert_eq!(siblings[2].child_index(), normal(3));
        assert_eq!(siblings[3].child_index(), normal(3));

        let run = account.derive_run_with(&curve, normal(0), 5).unwrap();
        let used: Vec<u32> = run.iter().map(|child| child.child_index().raw()).collect();
        assert_eq!(used, vec![0, 1, 3, 4, 5]);
        for child in &run {
            let expected = account.derive_child(child.child_index()).unwrap();
            assert_eq!(child.private_key(), expected.private_key());
        }
    }

    #[test]
    fn test_run_bounds() {
        let account = vector1_master();
        assert!(account.derive_run(normal(0), 0).unwrap().is_empty());
        let run = account.derive_run(normal(7), 3).unwrap();
        assert_eq!(run[0].child_index(), normal(7));
        assert_eq!(run[2].child_index(), normal(9));

        let near_end = ChildIndex::from_raw(crate::path::HARDENED_BIT - 2);
        assert!(matches!(
            account.derive_run(near_end, 3),
            Err(KeyTreeError::InvalidChildIndex(_))
        ));
    }
}
