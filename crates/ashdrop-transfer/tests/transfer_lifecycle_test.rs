//! End-to-end transfer lifecycle tests over an in-memory object store.
//!
//! These drive the gateway the way an edge would: seal a payload on the
//! client side, upload the envelope, then download and open it again.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use opendal::Operator;
use secrecy::SecretString;

use ashdrop_core::config::TransferConfig;
use ashdrop_core::{
    ObjectRef, TransferError, TransferId, TransferRecord, TransferState,
};
use ashdrop_crypto::{open, seal, Verifier};
use ashdrop_storage::{MemoryMetaStore, MetadataStore};
use ashdrop_transfer::{LogNotifier, Notifier, TransferGateway, UploadRequest};

fn memory_operator() -> Operator {
    Operator::new(opendal::services::Memory::default())
        .expect("memory operator")
        .finish()
}

fn gateway(
    meta: Arc<MemoryMetaStore>,
    op: Operator,
    config: TransferConfig,
) -> TransferGateway<MemoryMetaStore> {
    TransferGateway::new(meta, op, Arc::new(LogNotifier), config)
}

fn request(ciphertext: Bytes, verifier: Verifier) -> UploadRequest {
    UploadRequest {
        ciphertext,
        display_name: "quarterly-report.pdf".into(),
        owner_id: "alice".into(),
        verifier,
        deadline_minutes: None,
        receiver_contact: None,
        sender_name: None,
    }
}

/// A wrong passphrase is denied, the right one succeeds exactly once,
/// and the transfer is gone afterwards.
#[tokio::test]
async fn wrong_then_right_then_gone() {
    let meta = Arc::new(MemoryMetaStore::new());
    let op = memory_operator();
    let gw = gateway(Arc::clone(&meta), op.clone(), TransferConfig::default());

    let passphrase = SecretString::from("Correct-Horse-1");
    let envelope = seal(b"attack at dawn", &passphrase).unwrap();
    let verifier = Verifier::derive(&passphrase);

    let receipt = gw
        .upload(request(Bytes::from(envelope.clone()), verifier))
        .await
        .unwrap();

    let wrong = Verifier::derive(&SecretString::from("Wrong-Guess-99"));
    let denied = gw.download(receipt.reference.as_str(), &wrong).await;
    assert!(matches!(denied, Err(TransferError::AccessDenied)));

    // A denied attempt must not consume the transfer
    let payload = gw
        .download(receipt.reference.as_str(), &verifier)
        .await
        .unwrap();
    assert_eq!(payload.ciphertext, Bytes::from(envelope));
    assert_eq!(payload.display_name, "quarterly-report.pdf");
    assert_eq!(payload.extension, "pdf");

    // The receiving edge can open what it fetched
    let plaintext = open(&payload.ciphertext, &passphrase).unwrap();
    assert_eq!(plaintext, b"attack at dawn");

    // One-time use: the correct credential no longer helps
    let again = gw.download(receipt.reference.as_str(), &verifier).await;
    assert!(matches!(again, Err(TransferError::Gone)));

    // The object is physically gone and the record is terminal
    let record = meta.get(&receipt.id).await.unwrap().unwrap();
    assert_eq!(record.state, TransferState::Consumed);
    assert!(record.terminal_at.is_some());
    assert!(op.read(record.object_ref.as_str()).await.is_err());
}

#[tokio::test]
async fn unknown_reference_is_not_found() {
    let gw = gateway(
        Arc::new(MemoryMetaStore::new()),
        memory_operator(),
        TransferConfig::default(),
    );
    let verifier = Verifier::derive(&SecretString::from("Sunfl0wer"));

    let missing = format!("download/{}", TransferId::generate());
    assert!(matches!(
        gw.download(&missing, &verifier).await,
        Err(TransferError::NotFound)
    ));
    assert!(matches!(
        gw.download("download/not-a-uuid", &verifier).await,
        Err(TransferError::NotFound)
    ));
}

#[tokio::test]
async fn oversized_upload_rejected_before_storing() {
    let op = memory_operator();
    let gw = gateway(
        Arc::new(MemoryMetaStore::new()),
        op.clone(),
        TransferConfig {
            max_object_bytes: 64,
            ..TransferConfig::default()
        },
    );

    let verifier = Verifier::derive(&SecretString::from("Sunfl0wer"));
    let result = gw
        .upload(request(Bytes::from(vec![0u8; 65]), verifier))
        .await;
    assert!(matches!(result, Err(TransferError::Validation(_))));

    let entries = op.list("transfers/").await.unwrap();
    assert!(entries.is_empty(), "nothing may be stored on rejection");
}

#[tokio::test]
async fn empty_upload_rejected() {
    let gw = gateway(
        Arc::new(MemoryMetaStore::new()),
        memory_operator(),
        TransferConfig::default(),
    );
    let verifier = Verifier::derive(&SecretString::from("Sunfl0wer"));
    let result = gw.upload(request(Bytes::new(), verifier)).await;
    assert!(matches!(result, Err(TransferError::Validation(_))));
}

#[tokio::test]
async fn deadline_bounds_enforced() {
    let gw = gateway(
        Arc::new(MemoryMetaStore::new()),
        memory_operator(),
        TransferConfig::default(),
    );
    let verifier = Verifier::derive(&SecretString::from("Sunfl0wer"));

    for minutes in [0, -5, 1441] {
        let mut req = request(Bytes::from_static(b"sealed"), verifier);
        req.deadline_minutes = Some(minutes);
        assert!(
            matches!(gw.upload(req).await, Err(TransferError::Validation(_))),
            "deadline of {minutes} minutes must be rejected"
        );
    }

    let mut req = request(Bytes::from_static(b"sealed"), verifier);
    req.deadline_minutes = Some(1440);
    let receipt = gw.upload(req).await.unwrap();
    assert!(receipt.reference.as_str().starts_with("download/"));
}

/// A backdated deadline means `Gone` — with the right credential and with
/// a wrong one. Expiry always wins over the credential outcome.
#[tokio::test]
async fn expired_record_reports_gone_regardless_of_credential() {
    let meta = Arc::new(MemoryMetaStore::new());
    let op = memory_operator();
    let gw = gateway(Arc::clone(&meta), op.clone(), TransferConfig::default());

    let passphrase = SecretString::from("Correct-Horse-1");
    let verifier = Verifier::derive(&passphrase);

    // Plant an already-overdue record directly, the way a persisted one
    // would look after its deadline passed with no sweep yet.
    let id = TransferId::generate();
    let object_ref = ObjectRef::for_transfer(&id);
    op.write(object_ref.as_str(), b"sealed bytes".to_vec())
        .await
        .unwrap();
    meta.create(TransferRecord {
        id,
        owner_id: "alice".into(),
        object_ref: object_ref.clone(),
        display_name: "late.txt".into(),
        extension: "txt".into(),
        credential_verifier: verifier,
        created_at: Utc::now() - Duration::minutes(2),
        expires_at: Some(Utc::now() - Duration::seconds(1)),
        state: TransferState::Live,
        terminal_at: None,
    })
    .await
    .unwrap();

    let reference = format!("download/{id}");
    let wrong = Verifier::derive(&SecretString::from("Wrong-Guess-99"));

    assert!(matches!(
        gw.download(&reference, &wrong).await,
        Err(TransferError::Gone)
    ));
    // Correct credential on an expired record: still Gone, never denied
    assert!(matches!(
        gw.download(&reference, &verifier).await,
        Err(TransferError::Gone)
    ));

    let record = meta.get(&id).await.unwrap().unwrap();
    assert_eq!(record.state, TransferState::Expired);
    assert!(op.read(object_ref.as_str()).await.is_err(), "object erased");
}

#[tokio::test]
async fn listing_shows_history_newest_first() {
    let meta = Arc::new(MemoryMetaStore::new());
    let gw = gateway(Arc::clone(&meta), memory_operator(), TransferConfig::default());

    let passphrase = SecretString::from("Correct-Horse-1");
    let verifier = Verifier::derive(&passphrase);

    let mut first = request(Bytes::from_static(b"one"), verifier);
    first.display_name = "first.txt".into();
    let first = gw.upload(first).await.unwrap();

    let mut second = request(Bytes::from_static(b"two"), verifier);
    second.display_name = "second.txt".into();
    let second = gw.upload(second).await.unwrap();

    let mut other = request(Bytes::from_static(b"three"), verifier);
    other.owner_id = "bob".into();
    gw.upload(other).await.unwrap();

    // Consume one so the listing includes a terminal record
    gw.download(first.reference.as_str(), &verifier)
        .await
        .unwrap();

    let listed = gw.list_by_owner("alice").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
    assert_eq!(listed[1].state, TransferState::Consumed);

    assert_eq!(gw.list_by_owner("bob").await.unwrap().len(), 1);
    assert!(gw.list_by_owner("nobody").await.unwrap().is_empty());
}

// ── Notification hook ────────────────────────────────────────────────────

struct RecordingNotifier {
    tx: tokio::sync::mpsc::UnboundedSender<(String, TransferId)>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        contact: &str,
        id: &TransferId,
        _sender_name: Option<&str>,
    ) -> anyhow::Result<()> {
        self.tx.send((contact.to_string(), *id))?;
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait::async_trait]
impl Notifier for FailingNotifier {
    async fn notify(
        &self,
        _contact: &str,
        _id: &TransferId,
        _sender_name: Option<&str>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("mail provider unavailable")
    }
}

#[tokio::test]
async fn upload_fires_notification_with_id_only() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let gw = TransferGateway::new(
        Arc::new(MemoryMetaStore::new()),
        memory_operator(),
        Arc::new(RecordingNotifier { tx }),
        TransferConfig::default(),
    );

    let verifier = Verifier::derive(&SecretString::from("Sunfl0wer"));
    let mut req = request(Bytes::from_static(b"sealed"), verifier);
    req.receiver_contact = Some("receiver@example.com".into());
    req.sender_name = Some("Alice".into());
    let receipt = gw.upload(req).await.unwrap();

    let (contact, id) = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .expect("notification never fired")
        .unwrap();
    assert_eq!(contact, "receiver@example.com");
    assert_eq!(id, receipt.id);
}

#[tokio::test]
async fn notification_failure_does_not_fail_upload() {
    let gw = TransferGateway::new(
        Arc::new(MemoryMetaStore::new()),
        memory_operator(),
        Arc::new(FailingNotifier),
        TransferConfig::default(),
    );

    let verifier = Verifier::derive(&SecretString::from("Sunfl0wer"));
    let mut req = request(Bytes::from_static(b"sealed"), verifier);
    req.receiver_contact = Some("receiver@example.com".into());
    assert!(gw.upload(req).await.is_ok());
}

// ── Atomicity of upload ──────────────────────────────────────────────────

/// A store that refuses every create, to prove upload cleans up after
/// itself instead of leaving orphan ciphertext behind.
struct RefusingMetaStore;

#[async_trait::async_trait]
impl MetadataStore for RefusingMetaStore {
    async fn create(&self, _record: TransferRecord) -> Result<(), TransferError> {
        Err(TransferError::storage("record database is down"))
    }

    async fn get(&self, _id: &TransferId) -> Result<Option<TransferRecord>, TransferError> {
        Ok(None)
    }

    async fn list_by_owner(&self, _owner_id: &str) -> Result<Vec<TransferRecord>, TransferError> {
        Ok(Vec::new())
    }

    async fn find_expired(
        &self,
        _now: chrono::DateTime<Utc>,
    ) -> Result<Vec<TransferRecord>, TransferError> {
        Ok(Vec::new())
    }

    async fn transition(
        &self,
        _id: &TransferId,
        _to: TransferState,
        _at: chrono::DateTime<Utc>,
    ) -> Result<bool, TransferError> {
        Ok(false)
    }
}

#[tokio::test]
async fn record_failure_cleans_up_orphan_object() {
    let op = memory_operator();
    let gw = TransferGateway::new(
        Arc::new(RefusingMetaStore),
        op.clone(),
        Arc::new(LogNotifier),
        TransferConfig::default(),
    );

    let verifier = Verifier::derive(&SecretString::from("Sunfl0wer"));
    let result = gw.upload(request(Bytes::from_static(b"sealed"), verifier)).await;
    assert!(matches!(result, Err(TransferError::Storage(_))));

    let entries = op.list("transfers/").await.unwrap();
    assert!(entries.is_empty(), "orphan object must be deleted");
}
