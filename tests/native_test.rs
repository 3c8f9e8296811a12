mod common;

use common::{MEMORY_BINDINGS, MISSING_ACCOUNT};
use near_da_client::client::native::INITIAL_BLOB_CAPACITY;
use near_da_client::commitment::decode_da_commitment;
use near_da_client::{
    commitment_of, DaClient, DaError, FrameRef, Namespace, NativeConfig, Reference, ReferenceKind,
    SubmissionRouter, SubmitOutcome, SENTINEL_CANDIDATE,
};

fn config() -> NativeConfig {
    NativeConfig::new("alice.testnet", "ed25519:secret", "da.testnet", "Testnet", Namespace::new(0, 1))
}

fn client() -> DaClient {
    DaClient::native(&MEMORY_BINDINGS, &config()).unwrap()
}

fn submit_ref(client: &DaClient, data: &[u8]) -> Vec<u8> {
    match client.submit(SENTINEL_CANDIDATE, data).unwrap() {
        SubmitOutcome::Reference(r) => r.encode(),
        other => panic!("expected a reference, got {other:?}"),
    }
}

#[test]
fn test_submit_and_get_round_trip() {
    let client = client();
    let reference = submit_ref(&client, b"test data");
    assert_eq!(reference.len(), 64);
    assert_eq!(&reference[32..], &commitment_of(b"test data"));
    assert_eq!(client.get(&reference, 0).unwrap(), b"test data");
}

#[test]
fn test_sentinel_match_ignores_case() {
    let client = client();
    let outcome = client.submit(&SENTINEL_CANDIDATE.to_uppercase().replace("0X", "0x"), b"abc").unwrap();
    assert!(outcome.is_reference());
}

#[test]
fn test_other_candidates_pass_through() {
    let client = client();
    let outcome = client.submit("0x0000000000000000000000000000000000000001", b"test data").unwrap();
    assert_eq!(outcome, SubmitOutcome::PassThrough(b"test data".to_vec()));
}

#[test]
fn test_large_blob_is_fetched_after_resize() {
    let client = client();
    let data: Vec<u8> = (0..INITIAL_BLOB_CAPACITY * 2 + 17).map(|i| (i % 251) as u8).collect();
    let reference = submit_ref(&client, &data);
    assert_eq!(client.get(&reference, 3).unwrap(), data);
}

#[test]
fn test_unknown_transaction_is_a_retrieval_failure() {
    let client = client();
    let reference = FrameRef::new([7u8; 32], [0u8; 32]).encode();
    match client.get(&reference, 0) {
        Err(DaError::RetrievalFailed(msg)) => assert!(msg.contains("no data found"), "{msg}"),
        other => panic!("expected RetrievalFailed, got {other:?}"),
    }

    // The slot was cleared: the next call is unaffected.
    let reference = submit_ref(&client, b"after failure");
    assert_eq!(client.get(&reference, 1).unwrap(), b"after failure");
}

#[test]
fn test_commitment_mismatch_withholds_blob() {
    let client = client();
    let reference = submit_ref(&client, b"test data");
    let forged = FrameRef::new(reference[..32].try_into().unwrap(), commitment_of(b"other data")).encode();
    assert!(matches!(client.get(&forged, 0), Err(DaError::CommitmentMismatch { .. })));
}

#[test]
fn test_padding_after_frame_is_ignored() {
    let client = client();
    let mut reference = submit_ref(&client, b"padded");
    reference.extend_from_slice(&[0xEE; 8]);
    assert_eq!(client.get(&reference, 0).unwrap(), b"padded");
}

#[test]
fn test_short_reference_is_rejected() {
    let client = client();
    let err = client.get(&[0u8; 40], 0).unwrap_err();
    assert!(err.is_invalid_size());
}

#[test]
fn test_compact_references() {
    let mut cfg = config();
    cfg.reference_kind = ReferenceKind::Blob;
    let client = DaClient::native(&MEMORY_BINDINGS, &cfg).unwrap();

    let outcome = client.submit(SENTINEL_CANDIDATE, b"compact").unwrap();
    assert!(matches!(outcome.reference(), Some(Reference::Blob(_))));
    let reference = outcome.into_bytes();
    assert_eq!(reference.len(), 32);
    assert_eq!(client.get(&reference, 0).unwrap(), b"compact");
    assert!(client.get(&[0u8; 64], 0).unwrap_err().is_invalid_size());
}

#[test]
fn test_altda_round_trip() {
    let client = client();
    let commitment = client.submit_altda(b"altda payload").unwrap();
    assert_eq!(commitment.len(), 34);
    assert_eq!(decode_da_commitment(&commitment).unwrap().len(), 1);
    assert_eq!(client.get_altda(&commitment).unwrap(), b"altda payload");
}

#[test]
fn test_closed_client_rejects_calls() {
    let mut client = client();
    let reference = submit_ref(&client, b"test data");
    client.health().unwrap();

    client.close();
    client.close();
    assert!(matches!(client.submit(SENTINEL_CANDIDATE, b"x"), Err(DaError::ClientClosed)));
    assert!(matches!(client.get(&reference, 0), Err(DaError::ClientClosed)));
    assert!(matches!(client.health(), Err(DaError::ClientClosed)));
}

#[test]
fn test_unknown_network_is_rejected() {
    let mut cfg = config();
    cfg.network = "devnet".into();
    let err = DaClient::native(&MEMORY_BINDINGS, &cfg).unwrap_err();
    assert!(err.is_invalid_network());
}

#[test]
fn test_missing_account_fails_initialization() {
    let mut cfg = config();
    cfg.account_id = MISSING_ACCOUNT.into();
    match DaClient::native(&MEMORY_BINDINGS, &cfg) {
        Err(DaError::Initialization(msg)) => assert!(msg.contains("does not exist"), "{msg}"),
        other => panic!("expected Initialization, got {other:?}"),
    }
    // A later client is unaffected by the earlier failure.
    assert!(DaClient::native(&MEMORY_BINDINGS, &config()).is_ok());
}

#[test]
fn test_clients_share_the_library_across_threads() {
    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            std::thread::spawn(move || {
                let client = client();
                let data = vec![i; 1000];
                let reference = submit_ref(&client, &data);
                assert_eq!(client.get(&reference, i as u32).unwrap(), data);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_force_submit_with_custom_sentinel() {
    let mut inbox = [0u8; 20];
    inbox[19] = 0x42;
    let client = client().with_router(SubmissionRouter::with_sentinel(inbox));

    let reference = client.force_submit(b"test data").unwrap().into_bytes();
    assert_eq!(reference.len(), 64);
    assert_eq!(client.get(&reference, 0).unwrap(), b"test data");

    let commitment = client.submit_altda(b"test data").unwrap();
    assert_eq!(client.get_altda(&commitment).unwrap(), b"test data");
}

#[test]
fn test_one_client_shared_by_threads() {
    let client = client();
    std::thread::scope(|s| {
        for i in 0..4u8 {
            let client = &client;
            s.spawn(move || {
                let data = vec![i; 512];
                let reference = submit_ref(client, &data);
                assert_eq!(client.get(&reference, i as u32).unwrap(), data);
            });
        }
    });
}
