// connectivity.rs

use std::net::Ipv4Addr;

use tokio::time::{sleep_until, Instant};

use crate::*;

const LINK_EVENT_QUEUE: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ConnectivityState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    Associated,
    Disconnected,
    GotIp(Ipv4Addr),
    LostIp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkAction {
    None,
    RetryAfterDelay,
    Startup,
}

/// Starts association with the access point. Completion arrives as a `LinkEvent`.
pub trait LinkDriver: Send + Sync {
    fn associate(&self) -> anyhow::Result<()>;
}

/// Runs once for each rising edge into `Connected`.
pub trait DependentStartup: Send + Sync {
    fn on_connected(&self);
}

pub fn transition(state: ConnectivityState, event: LinkEvent) -> (ConnectivityState, LinkAction) {
    use ConnectivityState::*;
    match (state, event) {
        (Connected, LinkEvent::GotIp(_)) => (Connected, LinkAction::None),
        (_, LinkEvent::GotIp(_)) => (Connected, LinkAction::Startup),
        (Connected, LinkEvent::Disconnected) => (Disconnected, LinkAction::RetryAfterDelay),
        (s, LinkEvent::Disconnected) => (s, LinkAction::RetryAfterDelay),
        (Connected, LinkEvent::LostIp) => (Disconnected, LinkAction::None),
        (s, LinkEvent::LostIp) | (s, LinkEvent::Associated) => (s, LinkAction::None),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub state: ConnectivityState,
    pub ip: Option<Ipv4Addr>,
    pub edges: u32,
}

#[derive(Clone)]
pub struct Connectivity {
    rx: watch::Receiver<LinkStatus>,
}

impl Connectivity {
    pub fn status(&self) -> LinkStatus {
        *self.rx.borrow()
    }

    pub fn state(&self) -> ConnectivityState {
        self.rx.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectivityState::Connected
    }

    /// Completes on the next rising edge after the call. Never completes retroactively.
    pub async fn connected_edge(&self) {
        let mut rx = self.rx.clone();
        let seen = rx.borrow_and_update().edges;
        loop {
            if rx.changed().await.is_err() {
                // writer gone, no edge will ever come
                std::future::pending::<()>().await;
            }
            if rx.borrow_and_update().edges != seen {
                return;
            }
        }
    }

    /// Level wait, returns at once if already connected.
    pub async fn wait_connected(&self) -> anyhow::Result<()> {
        let mut rx = self.rx.clone();
        rx.wait_for(|s| s.state == ConnectivityState::Connected)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct LinkEventSender {
    tx: mpsc::Sender<LinkEvent>,
}

impl LinkEventSender {
    pub fn notify(&self, event: LinkEvent) {
        if let Err(e) = self.tx.try_send(event) {
            error!("Link event {event:?} lost: {e}");
        }
    }
}

pub fn link_events() -> (LinkEventSender, mpsc::Receiver<LinkEvent>) {
    let (tx, rx) = mpsc::channel(LINK_EVENT_QUEUE);
    (LinkEventSender { tx }, rx)
}

struct ManagerInner {
    state: Arc<StationState>,
    tx: watch::Sender<LinkStatus>,
    link: Arc<dyn LinkDriver>,
    startup: Arc<dyn DependentStartup>,
}

/// Sole writer of the connectivity state. Clones share the same cell.
#[derive(Clone)]
pub struct ConnectivityManager {
    inner: Arc<ManagerInner>,
}

impl ConnectivityManager {
    pub fn new(
        state: Arc<StationState>,
        link: Arc<dyn LinkDriver>,
        startup: Arc<dyn DependentStartup>,
    ) -> Self {
        let (tx, _rx) = watch::channel(LinkStatus::default());
        ConnectivityManager {
            inner: Arc::new(ManagerInner {
                state,
                tx,
                link,
                startup,
            }),
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        Connectivity {
            rx: self.inner.tx.subscribe(),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.inner.tx.borrow().state
    }

    pub fn start(&self) {
        info!("WiFi connecting...");
        self.associate();
    }

    fn associate(&self) {
        self.inner.tx.send_if_modified(|s| {
            let changed = s.state != ConnectivityState::Connecting;
            s.state = ConnectivityState::Connecting;
            changed
        });
        let n = Stats::bump(&self.inner.state.stats.associations);
        info!("WiFi association attempt #{n}");
        if let Err(e) = self.inner.link.associate() {
            error!("WiFi association failed to start: {e:?}");
        }
    }

    pub fn handle_event(&self, event: LinkEvent) -> LinkAction {
        let mut action = LinkAction::None;
        let mut prev = ConnectivityState::Disconnected;
        self.inner.tx.send_if_modified(|s| {
            let (next, a) = transition(s.state, event);
            prev = s.state;
            action = a;
            match event {
                LinkEvent::GotIp(ip) => s.ip = Some(ip),
                LinkEvent::LostIp | LinkEvent::Disconnected => s.ip = None,
                LinkEvent::Associated => {}
            }
            if a == LinkAction::Startup {
                s.edges = s.edges.wrapping_add(1);
            }
            let changed = next != s.state;
            s.state = next;
            changed
        });
        debug!("Link event {event:?}: {prev:?} -> {:?}", self.state());

        match action {
            LinkAction::None => {
                if event == LinkEvent::Associated {
                    info!("WiFi associated, waiting for address...");
                } else if prev == ConnectivityState::Connected && event == LinkEvent::LostIp {
                    warn!("WiFi address lost.");
                }
            }
            LinkAction::Startup => {
                if let LinkEvent::GotIp(ip) = event {
                    info!("WiFi connected, address {ip}");
                }
                Stats::bump(&self.inner.state.stats.startups);
                self.inner.startup.on_connected();
            }
            LinkAction::RetryAfterDelay => {
                if prev == ConnectivityState::Connected {
                    warn!("WiFi link lost.");
                } else {
                    warn!("WiFi association failed.");
                }
            }
        }
        action
    }

    fn retry(&self) {
        if self.state() == ConnectivityState::Connected {
            debug!("WiFi retry skipped, link is up.");
        } else {
            self.associate();
        }
    }

    /// Link events keep flowing while a retry is pending. An address cancels the retry.
    pub async fn run_events(&self, mut events: mpsc::Receiver<LinkEvent>) -> anyhow::Result<()> {
        let delay = self.inner.state.config.retry_delay();
        let mut retry_at: Option<Instant> = None;
        loop {
            let pending = retry_at;
            let retry_due = async move {
                match pending {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                ev = events.recv() => {
                    let Some(event) = ev else { break };
                    match self.handle_event(event) {
                        LinkAction::RetryAfterDelay => {
                            let at = *retry_at.get_or_insert_with(|| Instant::now() + delay);
                            let left = at.saturating_duration_since(Instant::now());
                            info!("WiFi retry in {left:?}");
                        }
                        LinkAction::Startup => retry_at = None,
                        LinkAction::None => {}
                    }
                }
                _ = retry_due => {
                    retry_at = None;
                    self.retry();
                }
            }
        }
        error!("Link event channel closed.");
        Ok(())
    }

    /// Re-associates when no connected edge shows up within one interval.
    pub async fn watchdog(&self) -> anyhow::Result<()> {
        let interval = self.inner.state.config.watchdog_interval();
        if interval.is_zero() {
            return Err(PipelineError::TimerPeriod { name: "watchdog" }.into());
        }
        let conn = self.connectivity();
        loop {
            if timeout(interval, conn.connected_edge()).await.is_ok() {
                debug!("Watchdog saw the link come up.");
            }
            if !conn.is_connected() {
                warn!("Watchdog: not connected after {interval:?}, re-associating.");
                self.associate();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectivityState::*;

    #[derive(Default)]
    struct CountingLink(AtomicU32);

    impl LinkDriver for CountingLink {
        fn associate(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingStartup(AtomicU32);

    impl DependentStartup for CountingStartup {
        fn on_connected(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 40);

    fn manager() -> (ConnectivityManager, Arc<CountingLink>, Arc<CountingStartup>) {
        let state = Arc::new(StationState::new(StationConfig::default()));
        let link = Arc::new(CountingLink::default());
        let startup = Arc::new(CountingStartup::default());
        let m = ConnectivityManager::new(state, link.clone(), startup.clone());
        (m, link, startup)
    }

    #[test]
    fn transition_table() {
        let ip = LinkEvent::GotIp(IP);
        assert_eq!(transition(Disconnected, ip), (Connected, LinkAction::Startup));
        assert_eq!(transition(Connecting, ip), (Connected, LinkAction::Startup));
        assert_eq!(transition(Connected, ip), (Connected, LinkAction::None));
        assert_eq!(
            transition(Connecting, LinkEvent::Disconnected),
            (Connecting, LinkAction::RetryAfterDelay)
        );
        assert_eq!(
            transition(Connected, LinkEvent::Disconnected),
            (Disconnected, LinkAction::RetryAfterDelay)
        );
        assert_eq!(
            transition(Connected, LinkEvent::LostIp),
            (Disconnected, LinkAction::None)
        );
        assert_eq!(
            transition(Connecting, LinkEvent::Associated),
            (Connecting, LinkAction::None)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn start_moves_to_connecting() {
        let (m, link, _) = manager();
        assert_eq!(m.state(), Disconnected);
        m.start();
        assert_eq!(m.state(), Connecting);
        assert_eq!(link.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_startup_per_rising_edge_while_flapping() {
        let (m, link, startup) = manager();
        m.start();
        for _ in 0..3 {
            m.handle_event(LinkEvent::Associated);
            m.handle_event(LinkEvent::GotIp(IP));
            assert_eq!(m.handle_event(LinkEvent::GotIp(IP)), LinkAction::None);
            assert_eq!(m.state(), Connected);
            assert_eq!(
                m.handle_event(LinkEvent::Disconnected),
                LinkAction::RetryAfterDelay
            );
            assert_eq!(m.state(), Disconnected);
        }
        m.handle_event(LinkEvent::GotIp(IP));
        m.handle_event(LinkEvent::LostIp);
        assert_eq!(m.state(), Disconnected);
        m.handle_event(LinkEvent::GotIp(IP));

        assert_eq!(startup.0.load(Ordering::SeqCst), 5);
        assert_eq!(m.connectivity().status().edges, 5);
        // retries belong to the event loop
        assert_eq!(link.0.load(Ordering::SeqCst), 1);
    }

    fn spawn_events(
        m: &ConnectivityManager,
    ) -> (LinkEventSender, tokio::task::JoinHandle<anyhow::Result<()>>) {
        let (tx, rx) = link_events();
        let mgr = m.clone();
        (tx, tokio::spawn(async move { mgr.run_events(rx).await }))
    }

    #[tokio::test(start_paused = true)]
    async fn failed_association_retries_after_delay() {
        let (m, link, startup) = manager();
        m.start();
        let (tx, task) = spawn_events(&m);

        tx.notify(LinkEvent::Disconnected);
        sleep(Duration::from_millis(4_900)).await;
        assert_eq!(link.0.load(Ordering::SeqCst), 1);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(m.state(), Connecting);
        assert_eq!(link.0.load(Ordering::SeqCst), 2);
        assert_eq!(startup.0.load(Ordering::SeqCst), 0);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn address_during_retry_delay_is_applied_at_once() {
        let (m, link, startup) = manager();
        m.start();
        let (tx, task) = spawn_events(&m);

        tx.notify(LinkEvent::Disconnected);
        sleep(Duration::from_millis(100)).await;
        tx.notify(LinkEvent::GotIp(IP));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(m.state(), Connected);
        assert_eq!(m.connectivity().status().ip, Some(IP));
        assert_eq!(startup.0.load(Ordering::SeqCst), 1);

        // the cancelled retry never fires
        sleep(Duration::from_secs(10)).await;
        assert_eq!(m.state(), Connected);
        assert_eq!(link.0.load(Ordering::SeqCst), 1);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn event_loop_ends_when_senders_are_gone() {
        let (m, _, _) = manager();
        let (tx, task) = spawn_events(&m);
        tx.notify(LinkEvent::Disconnected);
        drop(tx);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn edge_is_not_retroactive() {
        let (m, _, _) = manager();
        m.start();
        m.handle_event(LinkEvent::GotIp(IP));

        let conn = m.connectivity();
        assert!(conn.is_connected());
        conn.wait_connected().await.unwrap();
        assert!(timeout(Duration::from_secs(1), conn.connected_edge())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_waiter_sees_short_lived_edge() {
        let (m, _, _) = manager();
        m.start();
        let conn = m.connectivity();
        let waiter = tokio::spawn(async move { conn.connected_edge().await });
        sleep(Duration::from_millis(1)).await;

        // up and down again before the waiter gets to run
        m.handle_event(LinkEvent::GotIp(IP));
        m.handle_event(LinkEvent::LostIp);
        assert!(timeout(Duration::from_secs(1), waiter).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_reassociates_when_link_stays_down() {
        let (m, link, _) = manager();
        m.start();
        let wd = m.clone();
        let task = tokio::spawn(async move { wd.watchdog().await });

        sleep(Duration::from_secs(59)).await;
        assert_eq!(link.0.load(Ordering::SeqCst), 1);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(link.0.load(Ordering::SeqCst), 2);

        // once connected the watchdog stays quiet
        m.handle_event(LinkEvent::GotIp(IP));
        sleep(Duration::from_secs(300)).await;
        assert_eq!(link.0.load(Ordering::SeqCst), 2);
        task.abort();
    }
}

// EOF
