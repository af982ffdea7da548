//! Protocol Scenario Tests
//!
//! End-to-end flows across keypairs, UTXOs, the accumulator and the circuit
//! encoding, including negative cases.

mod scenario_tests {
    use crate::accumulator::{Accumulator, AccumulatorBits};
    use crate::hash::{field_modulus, hash2};
    use crate::limbs::{from_limbs, to_limbs, to_limbs_checked, LimbLayout, OverflowPolicy};
    use crate::primality::generate_rabin_miller_input;
    use crate::primes::random_prime;
    use crate::rsa::KeyPair;
    use crate::user::User;
    use crate::utxo::Utxo;
    use crate::ProtocolError;
    use num_bigint::BigUint;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    // =============================================================
    // UTXO Lifecycle
    // =============================================================

    mod utxo_lifecycle {
        use super::*;

        #[test]
        fn test_512_bit_secret_hash_is_deterministic_and_reopens() {
            let mut rng = rng(100);
            let key = KeyPair::generate(512, &mut rng).unwrap();
            let utxo = Utxo::mint(&key, &mut rng).unwrap();

            let first = utxo.secret_hash(64, 8).unwrap();
            let second = utxo.secret_hash(64, 8).unwrap();
            assert_eq!(first, second);

            // decrypt the commitment and hash the plaintext again
            let opened = key.decrypt(utxo.commitment());
            let limbs = to_limbs_checked(64, 8, &opened).unwrap();
            assert_eq!(hash2(&limbs[0], &limbs[1]).unwrap(), first);
        }

        #[test]
        fn test_owner_checks_own_utxos() {
            let mut rng = rng(101);
            let user = User::register(256, &mut rng).unwrap();
            for _ in 0..3 {
                let utxo = user.mint_utxo(&mut rng).unwrap();
                assert!(user.check_utxo(&utxo, 64, 4).unwrap());
            }
        }

        #[test]
        fn test_cross_user_check_is_false_not_error() {
            let mut rng = rng(102);
            let alice = User::register(256, &mut rng).unwrap();
            let bob = User::register(256, &mut rng).unwrap();

            let alice_utxo = alice.mint_utxo(&mut rng).unwrap();
            let bob_utxo = bob.mint_utxo(&mut rng).unwrap();

            assert_eq!(alice.check_utxo(&bob_utxo, 64, 4), Ok(false));
            assert_eq!(bob.check_utxo(&alice_utxo, 64, 4), Ok(false));
        }

        #[test]
        fn test_spend_record_matches_utxo() {
            let mut rng = rng(103);
            let user = User::register(256, &mut rng).unwrap();
            let utxo = user.mint_utxo(&mut rng).unwrap();
            let layout = LimbLayout::new(64, 4).unwrap();

            let input = utxo.spend_input(&layout).unwrap();
            let secret = layout.recompose(&input.secret).unwrap();
            let d = layout.recompose(&input.d).unwrap();
            let n = layout.recompose(&input.modulus).unwrap();
            let commitment = layout.recompose(&input.commitment).unwrap();

            // the spend circuit checks commitment^d == secret and secret^e == commitment
            assert_eq!(commitment.modpow(&d, &n), secret);
            assert_eq!(user.key_pair().encrypt(&secret), commitment);
            assert_eq!(input.nullifier_hash, hash2(&input.d[0], &input.secret[0]).unwrap());
        }

        #[test]
        fn test_hashes_are_field_elements() {
            let mut rng = rng(104);
            let user = User::register(256, &mut rng).unwrap();
            let utxo = user.mint_utxo(&mut rng).unwrap();
            let p = field_modulus();
            assert!(utxo.secret_hash(64, 4).unwrap() < p);
            assert!(utxo.nullifier_hash(64, 4).unwrap() < p);
        }
    }

    // =============================================================
    // Accumulator
    // =============================================================

    mod accumulator_flow {
        use super::*;

        const SMALL: AccumulatorBits = AccumulatorBits {
            g: 256,
            p: 128,
            q: 128,
            secret: 64,
        };

        #[test]
        fn test_proof_verifies_immediately_after_initialize() {
            let mut rng = rng(110);
            let acc = Accumulator::initialize(SMALL, &mut rng).unwrap();
            for _ in 0..4 {
                let x = random_prime(&mut rng, 64).unwrap();
                let proof = acc.generate_proof(&x).unwrap();
                assert!(acc.verify_proof(&x, &proof));
            }
        }

        #[test]
        fn test_accumulate_then_prove() {
            let mut rng = rng(111);
            let mut acc = Accumulator::initialize(SMALL, &mut rng).unwrap();
            let members: Vec<BigUint> = (0..3).map(|_| random_prime(&mut rng, 64).unwrap()).collect();

            for x in &members {
                acc.accumulate(x).unwrap();
            }
            for x in &members {
                let proof = acc.generate_proof(x).unwrap();
                assert!(acc.verify_proof(x, &proof));
            }
        }

        #[test]
        fn test_spend_round_trip_through_limbs() {
            let mut rng = rng(112);
            let acc = Accumulator::initialize(SMALL, &mut rng).unwrap();
            let layout = LimbLayout::new(64, 4).unwrap();
            let x = random_prime(&mut rng, 64).unwrap();

            let input = acc.spend_input(&x, &layout).unwrap();
            let n = layout.recompose(&input.modulus).unwrap();
            let witness = layout.recompose(&input.witness).unwrap();
            let commitment = layout.recompose(&input.commitment).unwrap();
            assert_eq!(witness.modpow(&input.secret, &n), commitment);
        }

        #[test]
        fn test_default_bits() {
            let bits = AccumulatorBits::default();
            assert_eq!((bits.g, bits.p, bits.q, bits.secret), (2048, 1024, 1024, 128));
        }
    }

    // =============================================================
    // Rabin-Miller Inputs
    // =============================================================

    mod rabin_miller {
        use super::*;

        #[test]
        fn test_carmichael_561_input_is_well_formed() {
            let mut rng = rng(120);
            let n = BigUint::from(561u32);
            let input = generate_rabin_miller_input(&n, 5, &mut rng).unwrap();

            assert_eq!(input.d, BigUint::from(35u32));
            assert_eq!(input.r, 4);
            assert_eq!(input.a.len(), 5);
            assert!(input.is_well_formed());
        }

        #[test]
        fn test_generated_prime_candidates() {
            let mut rng = rng(121);
            for bits in [16u64, 128, 512] {
                let n = random_prime(&mut rng, bits).unwrap();
                let input = generate_rabin_miller_input(&n, 3, &mut rng).unwrap();
                assert!(input.is_well_formed());
                assert!(input.r >= 1);
            }
        }
    }

    // =============================================================
    // Limb Encoding Edge Cases
    // =============================================================

    mod limb_encoding {
        use super::*;

        #[test]
        fn test_rsa_1024_modulus_round_trip() {
            let mut rng = rng(130);
            let key = KeyPair::generate(1024, &mut rng).unwrap();
            let layout = LimbLayout::rsa_1024();
            let limbs = layout.decompose(key.modulus()).unwrap();
            assert_eq!(limbs.len(), 16);
            assert_eq!(from_limbs(64, &limbs).unwrap(), *key.modulus());
        }

        #[test]
        fn test_oversized_value_policies() {
            let x = (BigUint::from(1u8) << 200) + 7u32;

            // truncating contract drops the high limb silently
            let truncated = to_limbs(64, 3, &x).unwrap();
            assert_eq!(from_limbs(64, &truncated).unwrap(), BigUint::from(7u32));

            let err = to_limbs_checked(64, 3, &x).unwrap_err();
            assert!(matches!(err, ProtocolError::RangeOverflow { bits: 201, .. }));

            let lenient = LimbLayout::new(64, 3)
                .unwrap()
                .with_overflow(OverflowPolicy::Truncate);
            assert_eq!(lenient.decompose(&x).unwrap(), truncated);
        }
    }
}
