//! [`Command`] executions driven against in-memory infrastructure.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use common::{
    money::Currency,
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    DateTime, Handler, Money,
};
use service::{
    command::{
        apply_gateway_event, approve_leasing_request, cancel_leasing_request,
        create_contract, create_leasing_request, create_order, create_receipt,
        delete_contract, reject_leasing_request, update_contract_status,
        ApplyGatewayEvent, ApproveLeasingRequest, CancelLeasingRequest,
        CreateContract, CreateLeasingRequest, CreateOrder, CreateReceipt,
        CreatedOrder, DeleteContract, RejectLeasingRequest,
        UpdateContractStatus,
    },
    domain::{
        contract, dorm, leasing_history, leasing_request, order, receipt,
        transaction, user, Contract, Dorm, LeasingHistory, LeasingRequest,
        Order, Receipt, Transaction, User,
    },
    infra::{
        database,
        payment::{self, event, Event, Gateway, Session},
        storage::{self, Storage},
    },
    read::{
        contract::{Active, Undecided},
        leasing_history::Open,
        leasing_request::Pending,
        order::Unpaid,
        transaction::Open as OpenTransaction,
    },
    Service,
};
use tracerr::Traced;

/// In-memory [`Database`] backed by [`HashMap`]s.
///
/// Transactions are modelled as a no-op: [`Transact`] hands out a clone
/// sharing the same state, and [`Lock`]/[`Commit`] do nothing, since every
/// test drives the [`Service`] from a single task.
///
/// [`Database`]: service::infra::Database
#[derive(Clone, Debug, Default)]
struct Mock(Arc<Mutex<State>>);

#[derive(Debug, Default)]
struct State {
    users: HashMap<user::Id, User>,
    dorms: HashMap<dorm::Id, Dorm>,
    leasing_requests: HashMap<leasing_request::Id, LeasingRequest>,
    contracts: HashMap<contract::Id, Contract>,
    leasing_histories: HashMap<leasing_history::Id, LeasingHistory>,
    orders: HashMap<order::Id, Order>,
    transactions: HashMap<transaction::Id, Transaction>,
    receipts: HashMap<receipt::Id, Receipt>,
}

impl Mock {
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    fn seed_user(&self, user: User) {
        _ = self.state().users.insert(user.id, user);
    }

    fn seed_dorm(&self, dorm: Dorm) {
        _ = self.state().dorms.insert(dorm.id, dorm);
    }

    fn contract(&self, id: contract::Id) -> Option<Contract> {
        self.state().contracts.get(&id).cloned()
    }

    fn transaction(&self, id: &transaction::Id) -> Option<Transaction> {
        self.state().transactions.get(id).cloned()
    }

    fn order(&self, id: order::Id) -> Option<Order> {
        self.state().orders.get(&id).cloned()
    }

    fn orders(&self) -> Vec<Order> {
        self.state().orders.values().cloned().collect()
    }

    fn seed_transaction(&self, transaction: Transaction) {
        _ = self
            .state()
            .transactions
            .insert(transaction.id.clone(), transaction);
    }

    fn histories_of(&self, dorm_id: dorm::Id) -> Vec<LeasingHistory> {
        self.state()
            .leasing_histories
            .values()
            .filter(|h| h.dorm_id == dorm_id)
            .cloned()
            .collect()
    }

    fn receipts(&self) -> Vec<Receipt> {
        self.state().receipts.values().cloned().collect()
    }

    fn close_history(&self, id: leasing_history::Id) {
        let mut state = self.state();
        let history = state.leasing_histories.get_mut(&id).unwrap();
        history.ended_at = Some(DateTime::now().coerce());
    }

    fn forget_receipt(&self, id: receipt::Id) {
        _ = self.state().receipts.remove(&id);
    }
}

type MockErr = Traced<database::Error>;

impl Handler<Transact> for Mock {
    type Ok = Self;
    type Err = MockErr;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Handler<Commit> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<LeasingRequest, leasing_request::Id>>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        _: Lock<By<LeasingRequest, leasing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<Contract, contract::Id>>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        _: Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<Dorm, dorm::Id>>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        _: Lock<By<Dorm, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<Order, order::Id>>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        _: Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<Transaction, transaction::Id>>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        _: Lock<By<Transaction, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Select<By<Option<User>, user::Id>>> for Mock {
    type Ok = Option<User>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .users
            .get(&by.into_inner())
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }
}

impl Handler<Select<By<Option<Dorm>, dorm::Id>>> for Mock {
    type Ok = Option<Dorm>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Dorm>, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .dorms
            .get(&by.into_inner())
            .filter(|d| d.deleted_at.is_none())
            .cloned())
    }
}

impl Handler<Select<By<Option<LeasingRequest>, leasing_request::Id>>>
    for Mock
{
    type Ok = Option<LeasingRequest>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<LeasingRequest>, leasing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().leasing_requests.get(&by.into_inner()).cloned())
    }
}

impl
    Handler<
        Select<By<Option<Pending<LeasingRequest>>, (dorm::Id, user::Id)>>,
    > for Mock
{
    type Ok = Option<Pending<LeasingRequest>>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Pending<LeasingRequest>>, (dorm::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (dorm_id, tenant_id) = by.into_inner();
        Ok(self
            .state()
            .leasing_requests
            .values()
            .find(|r| {
                r.dorm_id == dorm_id
                    && r.tenant_id == tenant_id
                    && r.is_pending()
            })
            .cloned()
            .map(Pending))
    }
}

impl Handler<Insert<LeasingRequest>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Insert(request): Insert<LeasingRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().leasing_requests.insert(request.id, request);
        Ok(())
    }
}

impl Handler<Update<LeasingRequest>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Update(request): Update<LeasingRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().leasing_requests.insert(request.id, request);
        Ok(())
    }
}

impl Handler<Select<By<Option<Contract>, contract::Id>>> for Mock {
    type Ok = Option<Contract>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().contracts.get(&by.into_inner()).cloned())
    }
}

impl Handler<Select<By<Option<Active<Contract>>, contract::Id>>> for Mock {
    type Ok = Option<Active<Contract>>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Contract>>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .contracts
            .get(&by.into_inner())
            .filter(|c| c.deleted_at.is_none())
            .cloned()
            .map(Active))
    }
}

impl Handler<Select<By<Option<Undecided<Contract>>, dorm::Id>>> for Mock {
    type Ok = Option<Undecided<Contract>>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Undecided<Contract>>, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let dorm_id = by.into_inner();
        Ok(self
            .state()
            .contracts
            .values()
            .find(|c| {
                c.dorm_id == dorm_id
                    && c.deleted_at.is_none()
                    && c.status() == contract::Status::Waiting
            })
            .cloned()
            .map(Undecided))
    }
}

impl Handler<Insert<Contract>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().contracts.insert(contract.id, contract);
        Ok(())
    }
}

impl Handler<Update<Contract>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().contracts.insert(contract.id, contract);
        Ok(())
    }
}

impl Handler<Delete<By<Contract, contract::Id>>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Delete(by): Delete<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        if let Some(contract) = self.state().contracts.get_mut(&by.into_inner())
        {
            contract.deleted_at = Some(DateTime::now().coerce());
        }
        Ok(())
    }
}

impl Handler<Insert<LeasingHistory>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Insert(history): Insert<LeasingHistory>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().leasing_histories.insert(history.id, history);
        Ok(())
    }
}

impl Handler<Select<By<Option<LeasingHistory>, leasing_history::Id>>>
    for Mock
{
    type Ok = Option<LeasingHistory>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<LeasingHistory>, leasing_history::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().leasing_histories.get(&by.into_inner()).cloned())
    }
}

impl Handler<Select<By<Option<Open<LeasingHistory>>, dorm::Id>>> for Mock {
    type Ok = Option<Open<LeasingHistory>>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Open<LeasingHistory>>, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let dorm_id = by.into_inner();
        Ok(self
            .state()
            .leasing_histories
            .values()
            .find(|h| h.dorm_id == dorm_id && h.is_open())
            .cloned()
            .map(Open))
    }
}

impl Handler<Insert<Order>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().orders.insert(order.id, order);
        Ok(())
    }
}

impl Handler<Update<Order>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().orders.insert(order.id, order);
        Ok(())
    }
}

impl Handler<Select<By<Option<Order>, order::Id>>> for Mock {
    type Ok = Option<Order>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().orders.get(&by.into_inner()).cloned())
    }
}

impl
    Handler<
        Select<By<Option<Unpaid<Order>>, (leasing_history::Id, order::Kind)>>,
    > for Mock
{
    type Ok = Option<Unpaid<Order>>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Unpaid<Order>>, (leasing_history::Id, order::Kind)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (history_id, kind) = by.into_inner();
        Ok(self
            .state()
            .orders
            .values()
            .find(|o| {
                o.history_id == history_id
                    && o.kind == kind
                    && o.paid_transaction_id.is_none()
            })
            .cloned()
            .map(Unpaid))
    }
}

impl Handler<Select<By<Option<OpenTransaction<Transaction>>, order::Id>>>
    for Mock
{
    type Ok = Option<OpenTransaction<Transaction>>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<OpenTransaction<Transaction>>, order::Id>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let order_id = by.into_inner();
        Ok(self
            .state()
            .transactions
            .values()
            .find(|t| {
                t.order_id == order_id
                    && t.status == transaction::Status::Open
            })
            .cloned()
            .map(OpenTransaction))
    }
}

impl Handler<Insert<Transaction>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Insert(transaction): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self
            .state()
            .transactions
            .insert(transaction.id.clone(), transaction);
        Ok(())
    }
}

impl Handler<Update<Transaction>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Update(transaction): Update<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self
            .state()
            .transactions
            .insert(transaction.id.clone(), transaction);
        Ok(())
    }
}

impl Handler<Select<By<Option<Transaction>, transaction::Id>>> for Mock {
    type Ok = Option<Transaction>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().transactions.get(&by.into_inner()).cloned())
    }
}

impl Handler<Update<By<Transaction, transaction::CreationDateTime>>>
    for Mock
{
    type Ok = Vec<transaction::Id>;
    type Err = MockErr;

    async fn execute(
        &self,
        Update(by): Update<By<Transaction, transaction::CreationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        Ok(self
            .state()
            .transactions
            .values_mut()
            .filter(|t| {
                t.status == transaction::Status::Open && t.created_at < deadline
            })
            .map(|t| {
                t.status = transaction::Status::Expired;
                t.id.clone()
            })
            .collect())
    }
}

impl Handler<Insert<Receipt>> for Mock {
    type Ok = ();
    type Err = MockErr;

    async fn execute(
        &self,
        Insert(receipt): Insert<Receipt>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().receipts.insert(receipt.id, receipt);
        Ok(())
    }
}

impl Handler<Select<By<Option<Receipt>, transaction::Id>>> for Mock {
    type Ok = Option<Receipt>;
    type Err = MockErr;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Receipt>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let transaction_id = by.into_inner();
        Ok(self
            .state()
            .receipts
            .values()
            .find(|r| r.transaction_id == transaction_id)
            .cloned())
    }
}

/// [`Gateway`] handing out checkout sessions with sequential IDs.
#[derive(Clone, Debug, Default)]
struct MockGateway(Arc<AtomicUsize>);

impl Gateway for MockGateway {
    async fn create_one_time_session(
        &self,
        _: &str,
        _: Money,
        _: &user::Email,
    ) -> Result<Session, Traced<payment::Error>> {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Session {
            id: transaction::Id::new(format!("cs_test_{n}")),
            checkout_url: format!("https://checkout.test/pay/{n}").into(),
        })
    }
}

/// [`Storage`] keeping documents in memory.
#[derive(Clone, Debug, Default)]
struct MockStorage(Arc<Mutex<HashMap<String, Vec<u8>>>>);

impl MockStorage {
    fn document(&self, key: &receipt::DocumentKey) -> Option<Vec<u8>> {
        self.0.lock().unwrap().get(&key.to_string()).cloned()
    }
}

impl Storage for MockStorage {
    async fn put(
        &self,
        key: &receipt::DocumentKey,
        _: &str,
        data: Vec<u8>,
    ) -> Result<(), Traced<storage::Error>> {
        _ = self.0.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn signed_url(
        &self,
        key: &receipt::DocumentKey,
        _: Duration,
    ) -> Result<String, Traced<storage::Error>> {
        if self.0.lock().unwrap().contains_key(&key.to_string()) {
            Ok(format!("mock://{key}"))
        } else {
            Err(tracerr::new!(storage::Error::NotFound(key.clone())))
        }
    }
}

type TestService = Service<Mock, MockGateway, MockStorage>;

fn config() -> service::Config {
    service::Config {
        jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(b"secret"),
        jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(b"secret"),
        sweep_open_transactions: service::task::sweep_open_transactions::Config {
            interval: Duration::from_secs(600),
            session_lifetime: Duration::from_secs(24 * 60 * 60),
        },
    }
}

fn new_user(role: user::Role) -> User {
    User {
        id: user::Id::new(),
        name: user::Name::new("Sam Doe").unwrap(),
        email: user::Email::new("sam.doe@example.com").unwrap(),
        role,
        created_at: DateTime::now().coerce(),
        deleted_at: None,
    }
}

/// Environment with a landlord, a tenant and a dorm seeded.
struct World {
    service: TestService,
    db: Mock,
    storage: MockStorage,
    landlord: User,
    tenant: User,
    dorm: Dorm,
}

fn world() -> World {
    let db = Mock::default();
    let storage = MockStorage::default();
    // The background environment is dropped: its tasks never get polled, so
    // no sweeping interferes with the assertions.
    let (service, _background) = Service::new(
        config(),
        db.clone(),
        MockGateway::default(),
        storage.clone(),
    );

    let landlord = new_user(user::Role::Landlord);
    let tenant = new_user(user::Role::Tenant);
    let dorm = Dorm {
        id: dorm::Id::new(),
        name: dorm::Name::new("Maple Hall 12B").unwrap(),
        owner_id: landlord.id,
        monthly_price: Money::from_minor_units(50_000, Currency::Usd),
        insurance_price: Money::from_minor_units(4_000, Currency::Usd),
        created_at: DateTime::now().coerce(),
        deleted_at: None,
    };
    db.seed_user(landlord.clone());
    db.seed_user(tenant.clone());
    db.seed_dorm(dorm.clone());

    World { service, db, storage, landlord, tenant, dorm }
}

impl World {
    async fn pending_request(&self) -> LeasingRequest {
        self.service
            .execute(CreateLeasingRequest {
                dorm_id: self.dorm.id,
                tenant_id: self.tenant.id,
            })
            .await
            .unwrap()
    }

    async fn accepted_request(&self) -> LeasingRequest {
        let request = self.pending_request().await;
        self.service
            .execute(ApproveLeasingRequest {
                id: request.id,
                acting_user_id: self.landlord.id,
            })
            .await
            .unwrap()
    }

    async fn contract(&self) -> Contract {
        let request = self.accepted_request().await;
        self.service
            .execute(CreateContract {
                leasing_request_id: request.id,
                acting_user_id: self.landlord.id,
            })
            .await
            .unwrap()
    }

    async fn sign(
        &self,
        contract_id: contract::Id,
        acting_user_id: user::Id,
    ) -> Result<Contract, Traced<update_contract_status::ExecutionError>> {
        self.service
            .execute(UpdateContractStatus {
                contract_id,
                status: contract::PartyStatus::Signed,
                acting_user_id,
            })
            .await
    }

    async fn open_history(&self) -> LeasingHistory {
        let contract = self.contract().await;
        _ = self.sign(contract.id, self.landlord.id).await.unwrap();
        _ = self.sign(contract.id, self.tenant.id).await.unwrap();
        self.db.histories_of(self.dorm.id).pop().unwrap()
    }

    async fn insurance_order(&self) -> CreatedOrder {
        let history = self.open_history().await;
        self.service
            .execute(CreateOrder {
                kind: order::Kind::Insurance,
                history_id: history.id,
            })
            .await
            .unwrap()
    }
}

fn completed(session_id: &transaction::Id, event_id: &str) -> Event {
    Event {
        id: event_id.to_owned().into(),
        kind: event::Kind::SessionCompleted,
        session_id: session_id.clone(),
    }
}

fn expired(session_id: &transaction::Id, event_id: &str) -> Event {
    Event {
        id: event_id.to_owned().into(),
        kind: event::Kind::SessionExpired,
        session_id: session_id.clone(),
    }
}

mod create_leasing_request_cmd {
    use super::*;

    #[tokio::test]
    async fn creates_pending_request() {
        let world = world();

        let request = world.pending_request().await;

        assert_eq!(request.status, leasing_request::Status::Pending);
        assert_eq!(request.landlord_id, world.landlord.id);
        assert_eq!(request.tenant_id, world.tenant.id);
        assert!(request.ended_at.is_none());
    }

    #[tokio::test]
    async fn denies_duplicate_pending_request() {
        let world = world();
        _ = world.pending_request().await;

        let err = world
            .service
            .execute(CreateLeasingRequest {
                dorm_id: world.dorm.id,
                tenant_id: world.tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            create_leasing_request::ExecutionError::AlreadyRequested(_),
        ));
    }

    #[tokio::test]
    async fn denies_request_for_unknown_dorm() {
        let world = world();

        let err = world
            .service
            .execute(CreateLeasingRequest {
                dorm_id: dorm::Id::new(),
                tenant_id: world.tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            create_leasing_request::ExecutionError::DormNotExists(_),
        ));
    }
}

mod negotiation {
    use super::*;

    #[tokio::test]
    async fn approval_ends_negotiation() {
        let world = world();

        let request = world.accepted_request().await;

        assert_eq!(request.status, leasing_request::Status::Accepted);
        assert!(request.ended_at.is_some());
    }

    #[tokio::test]
    async fn only_landlord_approves() {
        let world = world();
        let request = world.pending_request().await;

        let err = world
            .service
            .execute(ApproveLeasingRequest {
                id: request.id,
                acting_user_id: world.tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            approve_leasing_request::ExecutionError::NotLandlord(_),
        ));
    }

    #[tokio::test]
    async fn denies_second_approval() {
        let world = world();
        let request = world.accepted_request().await;

        let err = world
            .service
            .execute(ApproveLeasingRequest {
                id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            approve_leasing_request::ExecutionError::NotPending(
                leasing_request::Status::Accepted,
            ),
        ));
    }

    #[tokio::test]
    async fn rejection_ends_negotiation() {
        let world = world();
        let request = world.pending_request().await;

        let rejected = world
            .service
            .execute(RejectLeasingRequest {
                id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap();

        assert_eq!(rejected.status, leasing_request::Status::Rejected);
        assert!(rejected.ended_at.is_some());
    }

    #[tokio::test]
    async fn only_landlord_rejects() {
        let world = world();
        let request = world.pending_request().await;

        let err = world
            .service
            .execute(RejectLeasingRequest {
                id: request.id,
                acting_user_id: world.tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            reject_leasing_request::ExecutionError::NotLandlord(_),
        ));
    }

    #[tokio::test]
    async fn cancellation_ends_negotiation() {
        let world = world();
        let request = world.pending_request().await;

        let canceled = world
            .service
            .execute(CancelLeasingRequest {
                id: request.id,
                acting_user_id: world.tenant.id,
            })
            .await
            .unwrap();
        assert_eq!(canceled.status, leasing_request::Status::Canceled);

        // A canceled request cannot be revived by the landlord.
        let err = world
            .service
            .execute(ApproveLeasingRequest {
                id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            approve_leasing_request::ExecutionError::NotPending(
                leasing_request::Status::Canceled,
            ),
        ));
    }

    #[tokio::test]
    async fn only_tenant_cancels() {
        let world = world();
        let request = world.pending_request().await;

        let err = world
            .service
            .execute(CancelLeasingRequest {
                id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            cancel_leasing_request::ExecutionError::NotTenant(_),
        ));
    }
}

mod contracts {
    use super::*;

    #[tokio::test]
    async fn creates_contract_for_accepted_request() {
        let world = world();

        let contract = world.contract().await;

        assert_eq!(contract.landlord_status, contract::PartyStatus::Waiting);
        assert_eq!(contract.tenant_status, contract::PartyStatus::Waiting);
        assert_eq!(contract.status(), contract::Status::Waiting);
        assert_eq!(contract.dorm_id, world.dorm.id);
    }

    #[tokio::test]
    async fn denies_contract_for_pending_request() {
        let world = world();
        let request = world.pending_request().await;

        let err = world
            .service
            .execute(CreateContract {
                leasing_request_id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            create_contract::ExecutionError::NotAccepted(
                leasing_request::Status::Pending,
            ),
        ));
    }

    #[tokio::test]
    async fn only_landlord_creates_contract() {
        let world = world();
        let request = world.accepted_request().await;

        let err = world
            .service
            .execute(CreateContract {
                leasing_request_id: request.id,
                acting_user_id: world.tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            create_contract::ExecutionError::NotLandlord(_),
        ));
    }

    #[tokio::test]
    async fn denies_contract_over_undecided_dorm() {
        let world = world();
        let first = world.contract().await;

        let request = world.accepted_request().await;
        let err = world
            .service
            .execute(CreateContract {
                leasing_request_id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            create_contract::ExecutionError::DormContracted(_),
        ));

        // Once the first contract falls through, the dorm is up for grabs
        // again.
        _ = world
            .service
            .execute(UpdateContractStatus {
                contract_id: first.id,
                status: contract::PartyStatus::Cancelled,
                acting_user_id: world.tenant.id,
            })
            .await
            .unwrap();
        let second = world
            .service
            .execute(CreateContract {
                leasing_request_id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap();
        assert_eq!(second.dorm_id, world.dorm.id);
    }

    #[tokio::test]
    async fn dual_signing_opens_single_history() {
        let world = world();
        let contract = world.contract().await;

        let half_signed =
            world.sign(contract.id, world.landlord.id).await.unwrap();
        assert_eq!(half_signed.status(), contract::Status::Waiting);
        assert!(world.db.histories_of(world.dorm.id).is_empty());

        let signed = world.sign(contract.id, world.tenant.id).await.unwrap();
        assert_eq!(signed.status(), contract::Status::Signed);

        let histories = world.db.histories_of(world.dorm.id);
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].tenant_id, world.tenant.id);
        assert!(histories[0].ended_at.is_none());
    }

    #[tokio::test]
    async fn signing_order_is_symmetric() {
        let world = world();
        let contract = world.contract().await;

        _ = world.sign(contract.id, world.tenant.id).await.unwrap();
        assert!(world.db.histories_of(world.dorm.id).is_empty());
        _ = world.sign(contract.id, world.landlord.id).await.unwrap();

        assert_eq!(world.db.histories_of(world.dorm.id).len(), 1);
    }

    #[tokio::test]
    async fn denies_signing_over_occupied_dorm() {
        let world = world();
        _ = world.open_history().await;

        // A second tenant goes through the whole flow over the same dorm.
        let other = new_user(user::Role::Tenant);
        world.db.seed_user(other.clone());
        let request = world
            .service
            .execute(CreateLeasingRequest {
                dorm_id: world.dorm.id,
                tenant_id: other.id,
            })
            .await
            .unwrap();
        _ = world
            .service
            .execute(ApproveLeasingRequest {
                id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap();
        let contract = world
            .service
            .execute(CreateContract {
                leasing_request_id: request.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap();

        _ = world.sign(contract.id, world.landlord.id).await.unwrap();
        let err = world.sign(contract.id, other.id).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            update_contract_status::ExecutionError::DormOccupied(_),
        ));
        assert_eq!(world.db.histories_of(world.dorm.id).len(), 1);
    }

    #[tokio::test]
    async fn waiting_is_not_a_target_status() {
        let world = world();
        let contract = world.contract().await;

        let err = world
            .service
            .execute(UpdateContractStatus {
                contract_id: contract.id,
                status: contract::PartyStatus::Waiting,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            update_contract_status::ExecutionError::BadTargetStatus(
                contract::PartyStatus::Waiting,
            ),
        ));
    }

    #[tokio::test]
    async fn terminal_contract_accepts_no_decisions() {
        let world = world();
        let contract = world.contract().await;
        _ = world.sign(contract.id, world.landlord.id).await.unwrap();
        _ = world.sign(contract.id, world.tenant.id).await.unwrap();

        let err = world
            .service
            .execute(UpdateContractStatus {
                contract_id: contract.id,
                status: contract::PartyStatus::Cancelled,
                acting_user_id: world.tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            update_contract_status::ExecutionError::AlreadyTerminal(
                contract::Status::Signed,
            ),
        ));
    }

    #[tokio::test]
    async fn cancelled_contract_cannot_be_signed() {
        let world = world();
        let contract = world.contract().await;
        _ = world
            .service
            .execute(UpdateContractStatus {
                contract_id: contract.id,
                status: contract::PartyStatus::Cancelled,
                acting_user_id: world.tenant.id,
            })
            .await
            .unwrap();

        let err =
            world.sign(contract.id, world.landlord.id).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            update_contract_status::ExecutionError::AlreadyTerminal(
                contract::Status::Cancelled,
            ),
        ));
        assert!(world.db.histories_of(world.dorm.id).is_empty());
    }

    #[tokio::test]
    async fn only_parties_decide() {
        let world = world();
        let contract = world.contract().await;
        let admin = new_user(user::Role::Admin);
        world.db.seed_user(admin.clone());

        let err = world.sign(contract.id, admin.id).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            update_contract_status::ExecutionError::NotParty(_),
        ));
    }

    #[tokio::test]
    async fn only_admin_deletes_contract() {
        let world = world();
        let contract = world.contract().await;

        let err = world
            .service
            .execute(DeleteContract {
                contract_id: contract.id,
                acting_user_id: world.landlord.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            delete_contract::ExecutionError::NotAdmin(_),
        ));
    }

    #[tokio::test]
    async fn admin_soft_deletes_contract() {
        let world = world();
        let contract = world.contract().await;
        let admin = new_user(user::Role::Admin);
        world.db.seed_user(admin.clone());

        world
            .service
            .execute(DeleteContract {
                contract_id: contract.id,
                acting_user_id: admin.id,
            })
            .await
            .unwrap();

        // The row survives, but is gone for any further signing.
        assert!(world.db.contract(contract.id).unwrap().deleted_at.is_some());
        let err =
            world.sign(contract.id, world.landlord.id).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_contract_status::ExecutionError::NotExists(_),
        ));
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn creates_insurance_order_with_checkout_session() {
        let world = world();

        let created = world.insurance_order().await;

        assert_eq!(created.order.kind, order::Kind::Insurance);
        assert_eq!(created.order.price, world.dorm.insurance_price);
        assert!(created.order.paid_transaction_id.is_none());
        assert_eq!(
            String::from(created.checkout_url),
            "https://checkout.test/pay/1",
        );

        let transaction = world
            .db
            .transaction(&transaction::Id::new("cs_test_1"))
            .unwrap();
        assert_eq!(transaction.status, transaction::Status::Open);
        assert_eq!(transaction.order_id, created.order.id);
        assert_eq!(transaction.price, world.dorm.insurance_price);
    }

    #[tokio::test]
    async fn creates_monthly_bill_order() {
        let world = world();
        let history = world.open_history().await;

        let created = world
            .service
            .execute(CreateOrder {
                kind: order::Kind::MonthlyBill,
                history_id: history.id,
            })
            .await
            .unwrap();

        assert_eq!(created.order.price, world.dorm.monthly_price);
    }

    #[tokio::test]
    async fn denies_duplicate_unpaid_order_of_same_kind() {
        let world = world();
        let created = world.insurance_order().await;

        let err = world
            .service
            .execute(CreateOrder {
                kind: order::Kind::Insurance,
                history_id: created.order.history_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            create_order::ExecutionError::AlreadyPending(
                order::Kind::Insurance,
            ),
        ));

        // A different kind over the same history is fine.
        _ = world
            .service
            .execute(CreateOrder {
                kind: order::Kind::MonthlyBill,
                history_id: created.order.history_id,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rebills_order_once_its_session_expires() {
        let world = world();
        let created = world.insurance_order().await;
        _ = world
            .service
            .execute(ApplyGatewayEvent(expired(
                &transaction::Id::new("cs_test_1"),
                "evt_1",
            )))
            .await
            .unwrap();

        let rebilled = world
            .service
            .execute(CreateOrder {
                kind: order::Kind::Insurance,
                history_id: created.order.history_id,
            })
            .await
            .unwrap();

        // The abandoned checkout gets a fresh session, not a second order.
        assert_eq!(rebilled.order.id, created.order.id);
        assert_eq!(rebilled.order.price, created.order.price);
        assert_eq!(
            String::from(rebilled.checkout_url),
            "https://checkout.test/pay/2",
        );
        assert_eq!(world.db.orders().len(), 1);

        let fresh = world
            .db
            .transaction(&transaction::Id::new("cs_test_2"))
            .unwrap();
        assert_eq!(fresh.status, transaction::Status::Open);
        assert_eq!(fresh.order_id, created.order.id);

        // With the fresh session open, the duplicate guard kicks in again.
        let err = world
            .service
            .execute(CreateOrder {
                kind: order::Kind::Insurance,
                history_id: created.order.history_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            create_order::ExecutionError::AlreadyPending(_),
        ));
    }

    #[tokio::test]
    async fn denies_order_for_ended_history() {
        let world = world();
        let history = world.open_history().await;
        world.db.close_history(history.id);

        let err = world
            .service
            .execute(CreateOrder {
                kind: order::Kind::Insurance,
                history_id: history.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            create_order::ExecutionError::HistoryEnded(_),
        ));
    }
}

mod reconciliation {
    use super::*;

    #[tokio::test]
    async fn completed_event_reconciles_transaction() {
        let world = world();
        let created = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");

        let transaction = world
            .service
            .execute(ApplyGatewayEvent(completed(&session_id, "evt_1")))
            .await
            .unwrap();

        assert_eq!(transaction.status, transaction::Status::Complete);
        assert_eq!(
            transaction.last_event_id,
            Some("evt_1".to_owned().into()),
        );
        assert_eq!(
            world.db.order(created.order.id).unwrap().paid_transaction_id,
            Some(session_id.clone()),
        );

        let receipts = world.db.receipts();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].owner_id, world.tenant.id);
        assert_eq!(receipts[0].transaction_id, session_id);

        let document = world.storage.document(&receipts[0].document_key);
        let document = String::from_utf8(document.unwrap()).unwrap();
        assert!(document.contains("cs_test_1"));
        assert!(document.contains("Maple Hall 12B"));
    }

    #[tokio::test]
    async fn redelivered_event_is_idempotent() {
        let world = world();
        _ = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");
        let event = completed(&session_id, "evt_1");

        let first = world
            .service
            .execute(ApplyGatewayEvent(event.clone()))
            .await
            .unwrap();
        let second = world
            .service
            .execute(ApplyGatewayEvent(event))
            .await
            .unwrap();

        assert_eq!(first.status, transaction::Status::Complete);
        assert_eq!(second.status, transaction::Status::Complete);
        assert_eq!(world.db.receipts().len(), 1);
    }

    #[tokio::test]
    async fn redelivery_heals_missing_receipt() {
        let world = world();
        _ = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");
        _ = world
            .service
            .execute(ApplyGatewayEvent(completed(&session_id, "evt_1")))
            .await
            .unwrap();

        // Simulates a crash between the commit and the receipt generation.
        let lost = world.db.receipts().pop().unwrap();
        world.db.forget_receipt(lost.id);

        _ = world
            .service
            .execute(ApplyGatewayEvent(completed(&session_id, "evt_1")))
            .await
            .unwrap();

        assert_eq!(world.db.receipts().len(), 1);
    }

    #[tokio::test]
    async fn completed_event_never_reassigns_paid_transaction() {
        let world = world();
        let created = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");
        _ = world
            .service
            .execute(ApplyGatewayEvent(completed(&session_id, "evt_1")))
            .await
            .unwrap();

        // A second checkout session of the same order, still open at the
        // gateway while the first one settled the order.
        let late_id = transaction::Id::new("cs_test_late");
        world.db.seed_transaction(Transaction {
            id: late_id.clone(),
            order_id: created.order.id,
            status: transaction::Status::Open,
            price: created.order.price,
            last_event_id: None,
            created_at: DateTime::now().coerce(),
        });

        let late = world
            .service
            .execute(ApplyGatewayEvent(completed(&late_id, "evt_2")))
            .await
            .unwrap();

        assert_eq!(late.status, transaction::Status::Complete);
        assert_eq!(
            world.db.order(created.order.id).unwrap().paid_transaction_id,
            Some(session_id),
        );
        // The late payer still gets a receipt for the money taken.
        assert_eq!(world.db.receipts().len(), 2);
    }

    #[tokio::test]
    async fn expired_event_never_overrides_complete() {
        let world = world();
        _ = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");
        _ = world
            .service
            .execute(ApplyGatewayEvent(completed(&session_id, "evt_1")))
            .await
            .unwrap();

        let transaction = world
            .service
            .execute(ApplyGatewayEvent(expired(&session_id, "evt_2")))
            .await
            .unwrap();

        assert_eq!(transaction.status, transaction::Status::Complete);
        assert_eq!(
            world.db.transaction(&session_id).unwrap().status,
            transaction::Status::Complete,
        );
    }

    #[tokio::test]
    async fn expired_event_closes_open_transaction() {
        let world = world();
        let created = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");

        let transaction = world
            .service
            .execute(ApplyGatewayEvent(expired(&session_id, "evt_1")))
            .await
            .unwrap();

        assert_eq!(transaction.status, transaction::Status::Expired);
        assert!(world
            .db
            .order(created.order.id)
            .unwrap()
            .paid_transaction_id
            .is_none());
        assert!(world.db.receipts().is_empty());
    }

    #[tokio::test]
    async fn denies_event_of_unknown_session() {
        let world = world();
        _ = world.insurance_order().await;
        let unknown = transaction::Id::new("cs_test_nope");

        let err = world
            .service
            .execute(ApplyGatewayEvent(completed(&unknown, "evt_1")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            apply_gateway_event::ExecutionError::UnknownSession(_),
        ));
        assert_eq!(
            world
                .db
                .transaction(&transaction::Id::new("cs_test_1"))
                .unwrap()
                .status,
            transaction::Status::Open,
        );
    }
}

mod receipts {
    use super::*;

    #[tokio::test]
    async fn requires_complete_transaction() {
        let world = world();
        _ = world.insurance_order().await;

        let err = world
            .service
            .execute(CreateReceipt {
                transaction_id: transaction::Id::new("cs_test_1"),
                owner_id: world.tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            create_receipt::ExecutionError::NotComplete(
                transaction::Status::Open,
            ),
        ));
    }

    #[tokio::test]
    async fn denies_receipt_to_non_payer() {
        let world = world();
        _ = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");
        _ = world
            .service
            .execute(ApplyGatewayEvent(completed(&session_id, "evt_1")))
            .await
            .unwrap();

        let err = world
            .service
            .execute(CreateReceipt {
                transaction_id: session_id,
                owner_id: world.landlord.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            create_receipt::ExecutionError::NotOwner(_),
        ));
    }

    #[tokio::test]
    async fn creation_is_idempotent() {
        let world = world();
        _ = world.insurance_order().await;
        let session_id = transaction::Id::new("cs_test_1");
        _ = world
            .service
            .execute(ApplyGatewayEvent(completed(&session_id, "evt_1")))
            .await
            .unwrap();

        let first = world
            .service
            .execute(CreateReceipt {
                transaction_id: session_id.clone(),
                owner_id: world.tenant.id,
            })
            .await
            .unwrap();
        let second = world
            .service
            .execute(CreateReceipt {
                transaction_id: session_id,
                owner_id: world.tenant.id,
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(world.db.receipts().len(), 1);
    }
}
