//! Racing access to the nonce store and the login flow

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Barrier};
use std::thread;

use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use marketplace_auth_server::auth::{
    canonicalize, challenge_message, AuthError, AuthService, InMemoryUserDirectory,
    JwtSessionIssuer, NonceError, NonceStore, WalletAddress,
};

const ALICE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ALICE_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

fn address_for(i: u64) -> WalletAddress {
    canonicalize(&format!("0x{:040x}", i + 1)).unwrap()
}

#[test]
fn test_concurrent_generates_leave_one_record() {
    const THREADS: usize = 16;

    let store = Arc::new(NonceStore::new());
    let address = canonicalize(ALICE_ADDRESS).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let issued: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                scope.spawn(move || {
                    barrier.wait();
                    store.generate(address).nonce.into_inner()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(store.len(), 1);

    let survivor = store.consume(&address).unwrap();
    assert!(issued.contains(&survivor.nonce.as_str().to_string()));
    assert_eq!(store.consume(&address).unwrap_err(), NonceError::NotFound);
}

#[test]
fn test_concurrent_consumes_succeed_once() {
    const THREADS: usize = 16;

    let store = Arc::new(NonceStore::new());
    let address = canonicalize(ALICE_ADDRESS).unwrap();
    let issued = store.generate(address);
    let barrier = Arc::new(Barrier::new(THREADS));

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                scope.spawn(move || {
                    barrier.wait();
                    store.consume(&address)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].nonce, issued.nonce);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == NonceError::NotFound));
}

#[test]
fn test_race_on_one_address_leaves_others_untouched() {
    const BYSTANDERS: u64 = 64;
    const RACERS: usize = 8;

    let store = Arc::new(NonceStore::new());
    let contested = canonicalize(ALICE_ADDRESS).unwrap();
    store.generate(contested);

    thread::scope(|scope| {
        for i in 0..BYSTANDERS {
            let store = store.clone();
            scope.spawn(move || {
                store.generate(address_for(i));
            });
        }
        for _ in 0..RACERS {
            let store = store.clone();
            scope.spawn(move || {
                store.generate(contested);
                let _ = store.consume(&contested);
            });
        }
    });

    let distinct: HashSet<_> = (0..BYSTANDERS)
        .map(|i| store.consume(&address_for(i)).unwrap().nonce)
        .collect();
    assert_eq!(distinct.len(), BYSTANDERS as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_with_one_signature_succeed_once() {
    const ATTEMPTS: usize = 12;

    let service = Arc::new(AuthService::new(
        Arc::new(NonceStore::new()),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(JwtSessionIssuer::new(
            "access".to_string(),
            "refresh".to_string(),
            900,
            7,
        )),
    ));

    let challenge = service.request_nonce(ALICE_ADDRESS).unwrap();
    let signer = PrivateKeySigner::from_str(ALICE_KEY).unwrap();
    let signature = signer
        .sign_message_sync(challenge_message(&challenge.nonce).as_bytes())
        .unwrap();
    let signature = format!("0x{}", hex::encode(signature.as_bytes()));

    let handles: Vec<_> = (0..ATTEMPTS)
        .map(|_| {
            let service = service.clone();
            let signature = signature.clone();
            tokio::spawn(async move { service.login(ALICE_ADDRESS, &signature).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                successes += 1;
                assert_eq!(outcome.identity.address.to_checksum(), ALICE_ADDRESS);
            }
            Err(e) => assert!(matches!(e, AuthError::NonceNotFound), "unexpected {e}"),
        }
    }

    assert_eq!(successes, 1);
}
