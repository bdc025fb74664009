use std::sync::Barrier;

use digest::Digest;
use k256::Secp256k1;
use rand_core::OsRng;
use sha2::Sha256;

use crate::{
    aggregate, aggregate_nonce_bytes, aggregate_signatures, apply_tweaks, generate_nonce,
    generate_nonce_with_session_id, sign, verify_partial, AggregateNonce, AggregateSignature,
    AggregationState, Context, ContributionKind, CryptoFailure, MuSigError, NonceGenArguments,
    PartialSignature, PublicKey, PublicNonce, SecretKey, SecretNonce, SigningSession, Tweak,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Signer {
    sk: SecretKey<Secp256k1>,
    pk: PublicKey<Secp256k1>,
}

fn run_key_generation(n: usize) -> Vec<Signer> {
    (0..n)
        .map(|_| {
            let sk = SecretKey::random(&mut OsRng);
            let pk = sk.public_key();
            Signer { sk, pk }
        })
        .collect()
}

fn run_nonce_generation(
    signers: &[Signer],
    state: &AggregationState<Secp256k1>,
    msg: &[u8; 32],
) -> Vec<(SecretNonce<Secp256k1>, PublicNonce<Secp256k1>)> {
    signers
        .iter()
        .map(|s| {
            let args = NonceGenArguments {
                secret_key: &s.sk,
                public_key: &s.pk,
                message: msg,
                aggregation: Some(state),
                extra_input: None,
            };
            generate_nonce(&mut OsRng, args).unwrap()
        })
        .collect()
}

/// Run a whole ceremony, with every value crossing the wire in encoded form.
fn run_ceremony(
    signers: &[Signer],
    state: &AggregationState<Secp256k1>,
    msg: &[u8; 32],
) -> AggregateSignature<Secp256k1> {
    let nonces = run_nonce_generation(signers, state, msg);
    let encoded: Vec<_> = nonces.iter().map(|(_, p)| p.to_bytes()).collect();
    let aggregate_nonce = aggregate_nonce_bytes::<Secp256k1>(&encoded).unwrap();

    let session = SigningSession::from_digest(&aggregate_nonce, state, msg).unwrap();
    let mut partials = Vec::with_capacity(signers.len());
    for (signer, (secret_nonce, public_nonce)) in signers.iter().zip(nonces) {
        let partial = sign(&session, secret_nonce, &signer.sk).unwrap();
        let received = PartialSignature::from_bytes(&partial.to_bytes(), &session).unwrap();
        assert!(verify_partial(&session, &received, &signer.pk, &public_nonce, msg).unwrap());
        partials.push(received);
    }
    aggregate_signatures(&partials).unwrap()
}

/// Check a signature with an independent BIP-340 implementation.
fn schnorr_verify(
    state: &AggregationState<Secp256k1>,
    msg: &[u8],
    sig: &AggregateSignature<Secp256k1>,
) -> bool {
    let key =
        k256::schnorr::VerifyingKey::from_bytes(&state.x_only_public_key().to_bytes()).unwrap();
    let sig = k256::schnorr::Signature::try_from(&sig.to_bytes()[..]).unwrap();
    key.verify_raw(msg, &sig).is_ok()
}

#[test]
fn test_e2e() {
    init_tracing();
    let signers = run_key_generation(3);
    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
    let out = aggregate(&pks).unwrap();
    assert_eq!(out.state.x_only_public_key(), out.aggregate_key);

    let msg = [0xAB; 32];
    let sig = run_ceremony(&signers, &out.state, &msg);
    assert!(sig.verify(&out.aggregate_key, &msg));
    assert!(schnorr_verify(&out.state, &msg, &sig));

    // Any single byte of change breaks the signature.
    for i in 0..32 {
        let mut tampered = msg;
        tampered[i] ^= 0x01;
        assert!(!sig.verify(&out.aggregate_key, &tampered));
    }
    let bytes = sig.to_bytes();
    for i in 0..64 {
        let mut tampered = bytes;
        tampered[i] ^= 0x01;
        if let Ok(tampered) = AggregateSignature::<Secp256k1>::from_bytes(&tampered) {
            assert!(!tampered.verify(&out.aggregate_key, &msg));
        }
    }
}

#[test]
fn test_e2e_tweaked() {
    init_tracing();
    let signers = run_key_generation(3);
    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
    let out = aggregate(&pks).unwrap();

    let tweaks = [
        Tweak::plain([0x01; 32]),
        Tweak::x_only([0x02; 32]),
        Tweak::x_only([0x03; 32]),
        Tweak::plain([0x04; 32]),
    ];
    let state = apply_tweaks(&out.state, &tweaks).unwrap();
    assert_ne!(state.x_only_public_key(), out.aggregate_key);

    let msg = [0x42; 32];
    let sig = run_ceremony(&signers, &state, &msg);
    assert!(state.verify(&sig, &msg));
    assert!(schnorr_verify(&state, &msg, &sig));
    assert!(!out.state.verify(&sig, &msg));
}

#[test]
fn test_independent_signatures_verify() {
    let sk = k256::schnorr::SigningKey::from_bytes(&[0x07; 32]).unwrap();
    let msg = [0x99; 32];
    let sig = sk.sign_raw(&msg, &[0u8; 32]).unwrap();

    let key =
        crate::XOnlyPublicKey::<Secp256k1>::from_bytes(&sk.verifying_key().to_bytes()).unwrap();
    let sig = AggregateSignature::<Secp256k1>::from_bytes(&sig.to_bytes()).unwrap();
    assert!(sig.verify(&key, &msg));
    assert!(!sig.verify(&key, &[0x98; 32]));
}

#[test]
fn test_secret_nonce_can_move_between_processes() {
    let signers = run_key_generation(2);
    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
    let state = aggregate(&pks).unwrap().state;
    let msg = [0x10; 32];

    let mut nonces = run_nonce_generation(&signers, &state, &msg);
    let (secret_nonce, public_nonce) = nonces.remove(0);
    let stored = secret_nonce.into_bytes();
    let restored = SecretNonce::<Secp256k1>::from_bytes(&stored[..]).unwrap();
    assert_eq!(restored.public_nonce(), public_nonce);

    let aggregate_nonce = crate::aggregate_nonces(&[public_nonce, nonces[0].1]).unwrap();
    let session = SigningSession::new(&aggregate_nonce, &state, &msg);
    let partial = sign(&session, restored, &signers[0].sk).unwrap();
    assert!(session.verify_partial(&partial, &signers[0].pk, &public_nonce));
}

#[test]
fn test_deterministic_ceremony() {
    let signers = run_key_generation(2);
    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
    let state = aggregate(&pks).unwrap().state;
    let msg = [0x33; 32];

    let run = || {
        let mut partials = Vec::new();
        let nonces: Vec<_> = signers
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let args = NonceGenArguments {
                    secret_key: &s.sk,
                    public_key: &s.pk,
                    message: &msg,
                    aggregation: Some(&state),
                    extra_input: None,
                };
                generate_nonce_with_session_id(&[i as u8; 32], args).unwrap()
            })
            .collect();
        let public: Vec<_> = nonces.iter().map(|(_, p)| *p).collect();
        let session = SigningSession::new(&crate::aggregate_nonces(&public).unwrap(), &state, &msg);
        for (s, (secret, _)) in signers.iter().zip(nonces) {
            partials.push(sign(&session, secret, &s.sk).unwrap());
        }
        aggregate_signatures(&partials).unwrap()
    };
    let first = run();
    assert_eq!(first, run());
    assert!(state.verify(&first, &msg));
}

#[test]
fn test_invalid_nonce_is_isolated() {
    let signers = run_key_generation(4);
    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
    let state = aggregate(&pks).unwrap().state;
    let nonces = run_nonce_generation(&signers, &state, &[0u8; 32]);

    let mut encoded: Vec<Vec<u8>> = nonces.iter().map(|(_, p)| p.to_bytes().to_vec()).collect();
    // 0x02 followed by x = 5 is not on the curve.
    let mut off_curve = vec![0u8; 66];
    off_curve[0] = 0x02;
    off_curve[32] = 0x05;
    off_curve[33..].copy_from_slice(&encoded[3][33..]);
    encoded[3] = off_curve;

    let err = aggregate_nonce_bytes::<Secp256k1>(&encoded).unwrap_err();
    assert_eq!(
        err,
        MuSigError::InvalidContribution {
            index: 3,
            kind: ContributionKind::PublicNonce,
            reason: CryptoFailure::InvalidPoint,
        }
    );
    assert!(encoded[..3]
        .iter()
        .all(|n| PublicNonce::<Secp256k1>::from_bytes(n).is_ok()));
}

#[test]
fn test_bad_partial_signature_is_identified() {
    let signers = run_key_generation(3);
    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
    let state = aggregate(&pks).unwrap().state;
    let msg = [0x77; 32];

    let nonces = run_nonce_generation(&signers, &state, &msg);
    let public: Vec<_> = nonces.iter().map(|(_, p)| *p).collect();
    let aggregate_nonce: AggregateNonce<Secp256k1> = crate::aggregate_nonces(&public).unwrap();
    let session = SigningSession::new(&aggregate_nonce, &state, &msg);

    let mut partials: Vec<_> = signers
        .iter()
        .zip(nonces)
        .map(|(s, (secret, _))| sign(&session, secret, &s.sk).unwrap())
        .collect();
    let mut corrupted = partials[1].to_bytes();
    corrupted[31] ^= 0x01;
    partials[1] = PartialSignature::from_bytes(&corrupted, &session).unwrap();

    let sig = aggregate_signatures(&partials).unwrap();
    assert!(!state.verify(&sig, &msg));

    let culprits: Vec<_> = partials
        .iter()
        .zip(signers.iter().zip(&public))
        .enumerate()
        .filter(|(_, (p, (s, n)))| !session.verify_partial(p, &s.pk, n))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(culprits, vec![1]);
}

#[test]
fn test_e2e_arbitrary_data() {
    init_tracing();
    let signers = run_key_generation(3);
    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
    let state = aggregate(&pks).unwrap().state;

    let data = b"a message of any length, hashed before signing";
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(data));

    let nonces = run_nonce_generation(&signers, &state, &digest);
    let public: Vec<_> = nonces.iter().map(|(_, p)| *p).collect();
    let aggregate_nonce = crate::aggregate_nonces(&public).unwrap();
    let session = SigningSession::for_message(&aggregate_nonce, &state, data);
    assert_eq!(session.message(), &digest);

    let partials: Vec<_> = signers
        .iter()
        .zip(nonces)
        .map(|(s, (secret, _))| sign(&session, secret, &s.sk).unwrap())
        .collect();
    let sig = aggregate_signatures(&partials).unwrap();
    assert!(state.verify(&sig, &digest));
    assert!(schnorr_verify(&state, &digest, &sig));
    assert!(!schnorr_verify(&state, data, &sig));
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_public_types_are_send_and_sync() {
    assert_send_sync::<Context>();
    assert_send_sync::<AggregationState<Secp256k1>>();
    assert_send_sync::<SigningSession<Secp256k1>>();
    assert_send_sync::<PartialSignature<Secp256k1>>();
    assert_send_sync::<SecretNonce<Secp256k1>>();
    assert_send_sync::<PublicNonce<Secp256k1>>();
    assert_send_sync::<AggregateNonce<Secp256k1>>();
    assert_send_sync::<AggregateSignature<Secp256k1>>();
    assert_send_sync::<MuSigError>();
}

#[test]
fn test_concurrent_ceremonies_share_one_context() {
    init_tracing();
    const THREADS: usize = 8;
    let barrier = Barrier::new(THREADS);

    let contexts: Vec<&'static Context> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let context = crate::init();

                    let signers = run_key_generation(2 + i % 3);
                    let pks: Vec<_> = signers.iter().map(|s| s.pk).collect();
                    let state = aggregate(&pks).unwrap().state;
                    let msg = [i as u8; 32];
                    let sig = run_ceremony(&signers, &state, &msg);
                    assert!(state.verify(&sig, &msg));
                    context
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(contexts.iter().all(|c| std::ptr::eq(*c, contexts[0])));
    assert!(std::ptr::eq(contexts[0], crate::init()));
}
