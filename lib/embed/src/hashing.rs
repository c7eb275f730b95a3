//! Feature-hashing encoder.
//!
//! Each identifier token and each character trigram of the lowercased text is
//! hashed with SHA-256 into one of `dim` signed buckets; the bucket counts are
//! then scaled to unit length. SHA-256 keeps bucket assignment identical across
//! platforms and compiler versions, which persisted artifacts rely on.

use contractsim_core::{Encoder, EncoderBackend, EncoderDescriptor, Error, Result, Vector};
use sha2::{Digest, Sha256};

/// Name of the hashing scheme recorded in artifacts; bump on any change to
/// tokenization or weighting
pub const HASHING_MODEL: &str = "feature-hash-v1";

/// Same width as all-MiniLM-L6-v2
pub const DEFAULT_HASHING_DIM: usize = 384;

const WORD_WEIGHT: f32 = 2.0;
const TRIGRAM_WEIGHT: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dim: usize,
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidArgument(
                "hashing encoder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dim })
    }

    fn accumulate(&self, vector: &mut [f32], namespace: &[u8], token: &str, weight: f32) {
        let mut hasher = Sha256::new();
        hasher.update(namespace);
        hasher.update(token.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let hash = u64::from_le_bytes(bytes);

        let pos = (hash % self.dim as u64) as usize;
        // top bit picks the sign so collisions cancel instead of pile up
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[pos] += sign * weight;
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_HASHING_DIM,
        }
    }
}

impl Encoder for HashingEncoder {
    fn descriptor(&self) -> EncoderDescriptor {
        EncoderDescriptor {
            backend: EncoderBackend::Hashing,
            model: HASHING_MODEL.to_string(),
            dimensions: self.dim,
        }
    }

    fn dimensions(&self) -> usize {
        self.dim
    }

    fn encode(&self, text: &str) -> Result<Vector> {
        let mut vector = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();

        for word in lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .filter(|w| !w.is_empty())
        {
            self.accumulate(&mut vector, b"w:", word, WORD_WEIGHT);
        }

        // trigrams over whitespace-collapsed text, so formatting does not count
        let chars: Vec<char> = lowered
            .split_whitespace()
            .flat_map(|w| w.chars().chain(std::iter::once(' ')))
            .collect();
        let mut trigram = String::with_capacity(12);
        for window in chars.windows(3) {
            trigram.clear();
            trigram.extend(window);
            self.accumulate(&mut vector, b"t:", &trigram, TRIGRAM_WEIGHT);
        }

        let mut vector = Vector::new(vector);
        vector.normalize();
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = r#"
        contract Token {
            mapping(address => uint256) public balanceOf;
            function transfer(address to, uint256 amount) public returns (bool) {
                require(balanceOf[msg.sender] >= amount);
                balanceOf[msg.sender] -= amount;
                balanceOf[to] += amount;
                return true;
            }
        }"#;

    const OTHER_TOKEN: &str = r#"
        contract Coin {
            mapping(address => uint256) public balances;
            function transfer(address recipient, uint256 value) public returns (bool) {
                require(balances[msg.sender] >= value);
                balances[msg.sender] -= value;
                balances[recipient] += value;
                return true;
            }
        }"#;

    const BALLOT: &str = r#"
        contract Ballot {
            struct Proposal { bytes32 name; uint voteCount; }
            Proposal[] public proposals;
            function vote(uint proposal) external {
                proposals[proposal].voteCount += 1;
            }
            function winningProposal() public view returns (uint winner) {
                uint best = 0;
                for (uint p = 0; p < proposals.length; p++) {
                    if (proposals[p].voteCount > best) { best = proposals[p].voteCount; winner = p; }
                }
            }
        }"#;

    #[test]
    fn test_deterministic() {
        let encoder = HashingEncoder::default();
        let v1 = encoder.encode(TOKEN).unwrap();
        let v2 = encoder.encode(TOKEN).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(v1.dim(), DEFAULT_HASHING_DIM);
    }

    #[test]
    fn test_unit_length() {
        let encoder = HashingEncoder::new(64).unwrap();
        let v = encoder.encode("contract A { uint x; }").unwrap();
        let magnitude: f32 = v.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let encoder = HashingEncoder::new(16).unwrap();
        let v = encoder.encode("").unwrap();
        assert!(v.as_slice().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_whitespace_does_not_matter() {
        let encoder = HashingEncoder::default();
        let compact = encoder.encode("uint256 public total;").unwrap();
        let spread = encoder.encode("uint256   public\n\ttotal;").unwrap();
        assert_eq!(compact, spread);
    }

    #[test]
    fn test_similar_contracts_are_closer() {
        let encoder = HashingEncoder::default();
        let token = encoder.encode(TOKEN).unwrap();
        let other_token = encoder.encode(OTHER_TOKEN).unwrap();
        let ballot = encoder.encode(BALLOT).unwrap();
        assert!(token.l2_distance(&other_token) < token.l2_distance(&ballot));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            HashingEncoder::new(0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_descriptor() {
        let descriptor = HashingEncoder::new(32).unwrap().descriptor();
        assert_eq!(descriptor.backend, EncoderBackend::Hashing);
        assert_eq!(descriptor.model, HASHING_MODEL);
        assert_eq!(descriptor.dimensions, 32);
    }
}
