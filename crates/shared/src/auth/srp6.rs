// SRP6 - Secure Remote Password Protocol v6
//
// Server side of the authentication handshake spoken by the retail
// client. The protocol constants (N, g) are fixed by the client binary;
// every big integer crosses the wire in little-endian byte order.

use once_cell::sync::Lazy;
use subtle::ConstantTimeEq;

use super::big_number::BigNumber;
use super::crypto_hash::{sha1, Sha1Hash};

/// Salt byte size
pub const SALT_SIZE: usize = 32;
/// Verifier byte size
pub const VERIFIER_SIZE: usize = 32;
/// Public ephemeral (A / B) byte size
pub const KEY_SIZE: usize = 32;
/// Interleaved session key byte size
pub const SESSION_KEY_SIZE: usize = 40;
/// Proof (M1 / M2) byte size
pub const PROOF_SIZE: usize = 20;

/// Prime modulus N in wire (little-endian) order
pub const N_BYTES: [u8; 32] = [
    0xB7, 0x9B, 0x3E, 0x2A, 0x87, 0x82, 0x3C, 0xAB, 0x8F, 0x5E, 0xBF, 0xBF, 0x8E, 0xB1, 0x01,
    0x08, 0x53, 0x50, 0x06, 0x29, 0x8B, 0x5B, 0xAD, 0xBD, 0x5B, 0x53, 0xE1, 0x89, 0x5E, 0x64,
    0x4B, 0x89,
];

/// Generator g
pub const GENERATOR: u8 = 7;

/// Multiplier k
const MULTIPLIER: u32 = 3;

static N: Lazy<BigNumber> = Lazy::new(|| BigNumber::from_le_bytes(&N_BYTES));
static G: Lazy<BigNumber> = Lazy::new(|| BigNumber::from_u32(GENERATOR as u32));

/// Outcome of a successful proof verification
pub struct ProofOutcome {
    /// M2, echoed to the client so it can verify us in turn
    pub server_proof: [u8; PROOF_SIZE],
    /// The interleaved 40-byte session key K
    pub session_key: [u8; SESSION_KEY_SIZE],
}

/// Compute a fresh (salt, verifier) pair for a new account.
pub fn compute_verifier(username: &str, password: &str) -> ([u8; SALT_SIZE], [u8; VERIFIER_SIZE]) {
    let salt: [u8; SALT_SIZE] = rand::random();
    let verifier = verifier_with_salt(username, password, &salt);
    (salt, verifier)
}

/// Compute the verifier v = g^x mod N for a known salt, where
/// x = SHA1(salt || SHA1(UPPER(user) ":" UPPER(pass))) read little-endian.
pub fn verifier_with_salt(
    username: &str,
    password: &str,
    salt: &[u8; SALT_SIZE],
) -> [u8; VERIFIER_SIZE] {
    let x = credentials_hash(username, password, salt);
    let v = G.mod_exp(&x, &N);

    let mut out = [0u8; VERIFIER_SIZE];
    out.copy_from_slice(&v.to_le_bytes(VERIFIER_SIZE));
    out
}

fn credentials_hash(username: &str, password: &str, salt: &[u8; SALT_SIZE]) -> BigNumber {
    let credentials = format!("{}:{}", username, password).to_uppercase();
    let inner = sha1(credentials.as_bytes());

    let mut sha = Sha1Hash::new();
    sha.update_bytes(salt);
    sha.update_bytes(&inner);
    sha.finalize();

    BigNumber::from_le_bytes(sha.digest())
}

/// Derive the 40-byte session key from the shared secret S.
///
/// The little-endian bytes of S are trimmed of their leading-zero prefix
/// and realigned to an even offset, split into even/odd streams, each
/// stream SHA1-hashed, and the two digests interleaved byte by byte.
pub fn session_key_from_secret(s: &[u8]) -> [u8; SESSION_KEY_SIZE] {
    let mut start = s.iter().position(|&b| b != 0).unwrap_or(s.len());
    if start % 2 == 1 {
        start += 1;
    }

    let trimmed = &s[start.min(s.len())..];
    let half = trimmed.len() / 2;

    let mut even = Vec::with_capacity(half);
    let mut odd = Vec::with_capacity(half);
    for i in 0..half {
        even.push(trimmed[i * 2]);
        odd.push(trimmed[i * 2 + 1]);
    }

    let even_hash = sha1(&even);
    let odd_hash = sha1(&odd);

    let mut key = [0u8; SESSION_KEY_SIZE];
    for i in 0..PROOF_SIZE {
        key[i * 2] = even_hash[i];
        key[i * 2 + 1] = odd_hash[i];
    }
    key
}

/// Per-session SRP6 server state.
pub struct Srp6 {
    username: String,
    salt: [u8; SALT_SIZE],
    v: BigNumber,
    b: BigNumber,
    big_b: BigNumber,
}

impl Srp6 {
    /// Start a session from the account's stored salt and verifier.
    /// Draws a fresh 19-byte private ephemeral b and derives
    /// B = (k*v + g^b) mod N.
    pub fn new(username: &str, salt: &[u8; SALT_SIZE], verifier: &[u8; VERIFIER_SIZE]) -> Self {
        let v = BigNumber::from_le_bytes(verifier);
        let b = BigNumber::random(19);

        let kv = &(&v * MULTIPLIER) % &*N;
        let gb = G.mod_exp(&b, &N);
        let big_b = &(&kv + &gb) % &*N;

        Srp6 {
            username: username.to_uppercase(),
            salt: *salt,
            v,
            b,
            big_b,
        }
    }

    /// Server public ephemeral B as wire bytes
    pub fn public_ephemeral(&self) -> [u8; KEY_SIZE] {
        let mut out = [0u8; KEY_SIZE];
        out.copy_from_slice(&self.big_b.to_le_bytes(KEY_SIZE));
        out
    }

    /// Salt the session was started with
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }

    /// Verify the client proof M1 against its public ephemeral A.
    ///
    /// Returns the server proof M2 and the session key K on success.
    /// Every failure mode (A degenerate, proof mismatch) collapses to
    /// `None`; the session key is never exposed on a failed proof.
    pub fn verify_proof(
        &self,
        client_public: &[u8; KEY_SIZE],
        client_proof: &[u8; PROOF_SIZE],
    ) -> Option<ProofOutcome> {
        let a = BigNumber::from_le_bytes(client_public);

        // SRP safeguard: abort if A % N == 0 (covers A == 0)
        if (&a % &*N).is_zero() {
            return None;
        }

        let a_bytes = a.to_le_bytes(KEY_SIZE);
        let b_bytes = self.big_b.to_le_bytes(KEY_SIZE);

        // u = SHA1(A || B)
        let mut sha = Sha1Hash::new();
        sha.update_bytes(&a_bytes);
        sha.update_bytes(&b_bytes);
        sha.finalize();
        let u = BigNumber::from_le_bytes(sha.digest());

        // S = (A * v^u)^b mod N
        let v_u = self.v.mod_exp(&u, &N);
        let s = (&(&a * &v_u) % &*N).mod_exp(&self.b, &N);

        let session_key = session_key_from_secret(&s.to_le_bytes(KEY_SIZE));

        let expected = proof_hash(&self.username, &self.salt, &a_bytes, &b_bytes, &session_key);
        if !bool::from(expected.ct_eq(client_proof)) {
            return None;
        }

        // M2 = SHA1(A || M1 || K)
        let mut sha = Sha1Hash::new();
        sha.update_bytes(&a_bytes);
        sha.update_bytes(client_proof);
        sha.update_bytes(&session_key);
        sha.finalize();

        Some(ProofOutcome {
            server_proof: *sha.digest(),
            session_key,
        })
    }
}

/// M1 = SHA1(H(N) XOR H(g) || H(USERNAME) || salt || A || B || K)
fn proof_hash(
    username: &str,
    salt: &[u8; SALT_SIZE],
    a_bytes: &[u8],
    b_bytes: &[u8],
    session_key: &[u8; SESSION_KEY_SIZE],
) -> [u8; PROOF_SIZE] {
    let n_hash = sha1(&N_BYTES);
    let g_hash = sha1(&[GENERATOR]);

    let mut ng_xor = [0u8; PROOF_SIZE];
    for i in 0..PROOF_SIZE {
        ng_xor[i] = n_hash[i] ^ g_hash[i];
    }

    let user_hash = sha1(username.as_bytes());

    let mut sha = Sha1Hash::new();
    sha.update_bytes(&ng_xor);
    sha.update_bytes(&user_hash);
    sha.update_bytes(salt);
    sha.update_bytes(a_bytes);
    sha.update_bytes(b_bytes);
    sha.update_bytes(session_key);
    sha.finalize();
    *sha.digest()
}

/// Client half of the handshake. The server is only ever exercised by
/// the retail client; this mirror of its arithmetic lets tests and
/// protocol checks drive a complete exchange without one.
pub mod client {
    use super::*;

    pub struct ClientSession {
        a: BigNumber,
        big_a: BigNumber,
    }

    impl Default for ClientSession {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ClientSession {
        pub fn new() -> Self {
            let a = BigNumber::random(19);
            let big_a = G.mod_exp(&a, &N);
            ClientSession { a, big_a }
        }

        pub fn public_ephemeral(&self) -> [u8; KEY_SIZE] {
            let mut out = [0u8; KEY_SIZE];
            out.copy_from_slice(&self.big_a.to_le_bytes(KEY_SIZE));
            out
        }

        /// Compute M1 and K the way the retail client does:
        /// S = (B - k*g^x)^(a + u*x) mod N
        pub fn proof(
            &self,
            username: &str,
            password: &str,
            salt: &[u8; SALT_SIZE],
            server_public: &[u8; KEY_SIZE],
        ) -> ([u8; PROOF_SIZE], [u8; SESSION_KEY_SIZE]) {
            let username = username.to_uppercase();
            let big_b = BigNumber::from_le_bytes(server_public);

            let a_bytes = self.big_a.to_le_bytes(KEY_SIZE);
            let b_bytes = big_b.to_le_bytes(KEY_SIZE);

            let mut sha = Sha1Hash::new();
            sha.update_bytes(&a_bytes);
            sha.update_bytes(&b_bytes);
            sha.finalize();
            let u = BigNumber::from_le_bytes(sha.digest());

            let x = credentials_hash(&username, password, salt);
            let gx = G.mod_exp(&x, &N);
            let kgx = &(&gx * MULTIPLIER) % &*N;

            // (B - k*g^x) mod N, kept positive by adding N first
            let base = &(&(&big_b + &*N) - &kgx) % &*N;
            let exponent = &(&u * &x) + &self.a;
            let s = base.mod_exp(&exponent, &N);

            let session_key = session_key_from_secret(&s.to_le_bytes(KEY_SIZE));
            let m1 = proof_hash(&username, salt, &a_bytes, &b_bytes, &session_key);
            (m1, session_key)
        }
    }
}
