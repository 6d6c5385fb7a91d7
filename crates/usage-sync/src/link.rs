use log::{info, warn};

/// A network link capability.
pub trait Link {
    /// Whether the link is up and able to carry requests.
    fn is_connected(&self) -> bool;
}

impl<L: Link> Link for &L {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

// Default interval between two link checks.
const DEFAULT_CHECK_INTERVAL_MS: u64 = 10_000;

/// A change of the link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link came up.
    Connected,
    /// The link went down.
    Disconnected,
}

/// The action requested by a [`LinkWatch`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCheck {
    /// The link state change observed by this check, if any.
    pub event: Option<LinkEvent>,
    /// Whether the link is down and a reconnection should be started.
    pub reconnect: bool,
}

/// Periodic link supervision.
///
/// A [`LinkWatch`] is polled on every loop iteration, but it only inspects
/// the link once per check interval. Only state transitions are reported, so
/// a flapping link does not flood the log.
#[derive(Debug, Clone, Copy)]
pub struct LinkWatch {
    check_interval_ms: u64,
    last_check_ms: Option<u64>,
    was_connected: bool,
}

impl Default for LinkWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkWatch {
    /// Creates a [`LinkWatch`] with a check interval of 10 seconds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            last_check_ms: None,
            was_connected: false,
        }
    }

    /// Sets the interval, in milliseconds, between two link checks.
    #[must_use]
    pub const fn check_interval(mut self, interval_ms: u64) -> Self {
        self.check_interval_ms = interval_ms;
        self
    }

    /// Polls the link.
    ///
    /// Returns [`None`] when the check interval has not elapsed yet.
    pub fn poll<L: Link>(&mut self, link: &L, now_ms: u64) -> Option<LinkCheck> {
        if let Some(last) = self.last_check_ms
            && now_ms.saturating_sub(last) < self.check_interval_ms
        {
            return None;
        }
        self.last_check_ms = Some(now_ms);

        let connected = link.is_connected();

        let event = if connected == self.was_connected {
            None
        } else {
            self.was_connected = connected;
            if connected {
                info!("Link connected");
                Some(LinkEvent::Connected)
            } else {
                warn!("Link disconnected, reconnecting...");
                Some(LinkEvent::Disconnected)
            }
        };

        Some(LinkCheck {
            event,
            reconnect: !connected,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::MockLink;

    use super::{LinkCheck, LinkEvent, LinkWatch};

    #[test]
    fn reports_transitions_only() {
        let link = MockLink::new(true);
        let mut watch = LinkWatch::new().check_interval(1_000);

        assert_eq!(
            watch.poll(&link, 0),
            Some(LinkCheck {
                event: Some(LinkEvent::Connected),
                reconnect: false,
            })
        );

        // Inside the check interval nothing is inspected.
        assert_eq!(watch.poll(&link, 999), None);

        // Same state, no event.
        assert_eq!(
            watch.poll(&link, 1_000),
            Some(LinkCheck {
                event: None,
                reconnect: false,
            })
        );

        link.set(false);
        assert_eq!(
            watch.poll(&link, 2_000),
            Some(LinkCheck {
                event: Some(LinkEvent::Disconnected),
                reconnect: true,
            })
        );

        // Still down: no new event, but keep asking for a reconnection.
        assert_eq!(
            watch.poll(&link, 3_000),
            Some(LinkCheck {
                event: None,
                reconnect: true,
            })
        );
    }
}
