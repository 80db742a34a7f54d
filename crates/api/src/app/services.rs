//! Infrastructure wiring: ERP seam, gateway, bus, queue, workers, scheduler.

use std::sync::{Arc, Mutex};

use tracing::info;

use dentiva_erp::InMemoryOrderService;
use dentiva_events::{InMemoryMessageBus, StorefrontEvent};
use dentiva_gateway::MockGateway;
use dentiva_jobs::{
    InMemoryJobStore, JobExecutor, JobExecutorConfig, JobExecutorHandle, JobStore, OrderQueue,
    OrderQueueConfig,
};
use dentiva_pipeline::{
    FulfillmentConfig, FulfillmentOrchestrator, LoggingEmailSender, NotificationDispatcher,
    PaymentOrchestrator, WorkerHandle,
};
use dentiva_scheduler::{DailyTimer, OrderProcessor, RecurringOrderScheduler, TimerHandle};

use crate::config::ApiConfig;

type Erp = Arc<InMemoryOrderService>;
type Bus = Arc<InMemoryMessageBus<StorefrontEvent>>;
pub type Processor = OrderProcessor<Erp, Bus>;

/// Background threads owned by the process; joined on shutdown.
struct ServiceHandles {
    workers: Vec<WorkerHandle>,
    executor: Option<JobExecutorHandle>,
    timer: TimerHandle,
}

/// Everything the routes need, plus the running background services.
pub struct AppServices {
    pub erp: Erp,
    pub gateway: Arc<MockGateway>,
    pub bus: Bus,
    pub queue: OrderQueue,
    pub processor: Arc<Processor>,
    pub scheduler: RecurringOrderScheduler<Erp>,
    handles: Mutex<Option<ServiceHandles>>,
}

impl AppServices {
    /// Stop all background threads. Idempotent.
    pub fn shutdown(&self) {
        let Some(handles) = self.handles.lock().unwrap().take() else {
            return;
        };
        handles.timer.shutdown();
        if let Some(executor) = handles.executor {
            executor.shutdown();
        }
        for worker in handles.workers {
            worker.shutdown();
        }
    }
}

/// Wire up the full pipeline.
///
/// The ERP and payment gateway are the in-process stand-ins; the production
/// adapters (OAuth1 ERP client, Stripe/VersaPay) are deployed as separate
/// builds of those seams. The job store is Redis when configured and
/// compiled in, in-memory otherwise.
pub fn build_services(config: &ApiConfig) -> Arc<AppServices> {
    let erp: Erp = Arc::new(InMemoryOrderService::new());
    let gateway = Arc::new(MockGateway::new());
    let bus: Bus = Arc::new(InMemoryMessageBus::new());
    let processor = Arc::new(OrderProcessor::new(erp.clone(), bus.clone()));

    let store = job_store(config);
    let queue = OrderQueue::new(
        store.clone(),
        processor.clone().into_fallback(),
        OrderQueueConfig::default(),
    );

    // Bus consumers, one thread each.
    let workers = vec![
        PaymentOrchestrator::new(gateway.clone(), bus.clone()).spawn(&bus),
        FulfillmentOrchestrator::new(erp.clone(), bus.clone(), FulfillmentConfig::default())
            .spawn(&bus),
        NotificationDispatcher::new(Arc::new(LoggingEmailSender)).spawn(&bus),
    ];

    // Job workers, when there is a store to pull from.
    let executor = store.map(|store| {
        let mut executor = JobExecutor::new(store);
        executor.register_handler("process-order", processor.clone().job_handler());
        executor.spawn(
            JobExecutorConfig::default()
                .with_name("order-jobs")
                .with_workers(config.worker_concurrency),
        )
    });

    let scheduler = RecurringOrderScheduler::new(erp.clone(), queue.clone());
    let timer = DailyTimer::spawn_after(
        RecurringOrderScheduler::new(erp.clone(), queue.clone()),
        config.scheduler_initial_delay,
        config.scheduler_period,
    );

    info!(
        workers = config.worker_concurrency,
        redis = config.redis_url.is_some(),
        "storefront services started"
    );

    Arc::new(AppServices {
        erp,
        gateway,
        bus,
        queue,
        processor,
        scheduler,
        handles: Mutex::new(Some(ServiceHandles {
            workers,
            executor,
            timer,
        })),
    })
}

#[cfg(feature = "redis")]
fn job_store(config: &ApiConfig) -> Option<Arc<dyn JobStore>> {
    if !config.use_queue {
        return None;
    }
    match &config.redis_url {
        Some(url) => match dentiva_jobs::RedisJobStore::new(url) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::error!(error = %e, "redis unavailable, using in-memory job store");
                Some(Arc::new(InMemoryJobStore::new()))
            }
        },
        None => Some(Arc::new(InMemoryJobStore::new())),
    }
}

#[cfg(not(feature = "redis"))]
fn job_store(config: &ApiConfig) -> Option<Arc<dyn JobStore>> {
    config
        .use_queue
        .then(|| Arc::new(InMemoryJobStore::new()) as Arc<dyn JobStore>)
}
