use super::{
    WaitError, WaitSpec, ABSENCE_POLL, DEFAULT_POLL, FINE_POLL, LOADING_APPEAR_TIMEOUT,
    LOADING_DISAPPEAR_TIMEOUT, VALUE_SETTLE, VALUE_TIMEOUT,
};
use crate::driver::traits::{BrowserSession, DriverError, ElementRef, Locator, Transient};
use crate::utils::interrupt::Interrupt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Polls the browser DOM until an element reaches the awaited state
#[derive(Clone)]
pub struct WaitEngine {
    session: Arc<dyn BrowserSession>,
    interrupt: Interrupt,
}

impl WaitEngine {
    pub fn new(session: Arc<dyn BrowserSession>, interrupt: Interrupt) -> Self {
        Self { session, interrupt }
    }

    pub fn session(&self) -> &Arc<dyn BrowserSession> {
        &self.session
    }

    /// Core loop shared by every wait.
    ///
    /// `probe` yields `Some` once the condition holds. Errors listed in
    /// `spec.ignoring` are remembered and retried; others end the wait. The loop
    /// never fails before `spec.timeout` and never sleeps past it.
    pub async fn poll_until<T, F, Fut>(
        &self,
        what: &str,
        spec: &WaitSpec,
        mut probe: F,
    ) -> Result<T, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, DriverError>>,
    {
        let start = Instant::now();
        let mut last_error = None;

        loop {
            if self.interrupt.is_set() {
                return Err(WaitError::Interrupted {
                    what: what.to_string(),
                });
            }

            match probe().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if spec.tolerates(&e) => last_error = Some(e.to_string()),
                Err(e) => return Err(e.into()),
            }

            let elapsed = start.elapsed();
            if elapsed >= spec.timeout {
                return Err(WaitError::Timeout {
                    what: what.to_string(),
                    elapsed,
                    last_error,
                });
            }

            tokio::time::sleep(spec.poll_interval.min(spec.timeout - elapsed)).await;
        }
    }

    /// Wait until the first element matching `locator` is displayed
    pub async fn wait_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementRef, WaitError> {
        let spec = WaitSpec::new(timeout)
            .polling_every(DEFAULT_POLL)
            .ignoring(&[Transient::NotPresent, Transient::Stale]);
        let session = &self.session;

        self.poll_until(&format!("{} to be visible", locator), &spec, || async move {
            let first = session.find_element(locator).await?;
            let displayed = session.is_displayed(&first).await?;
            Ok::<_, DriverError>(displayed.then_some(first))
        })
        .await
    }

    /// Wait until an already resolved element is displayed
    pub async fn wait_element_ref(
        &self,
        element: &ElementRef,
        timeout: Duration,
    ) -> Result<ElementRef, WaitError> {
        let spec = WaitSpec::new(timeout).polling_every(FINE_POLL).ignoring(&[
            Transient::NotPresent,
            Transient::Stale,
            Transient::NotInteractable,
        ]);
        let session = &self.session;

        self.poll_until(&format!("{} to be visible", element), &spec, || async move {
            let displayed = session.is_displayed(element).await?;
            Ok::<_, DriverError>(displayed.then(|| element.clone()))
        })
        .await
    }

    /// Wait until at least one element matches and every match is displayed
    pub async fn wait_elements(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<ElementRef>, WaitError> {
        let spec = WaitSpec::new(timeout)
            .polling_every(FINE_POLL)
            .ignoring(&[Transient::NotPresent, Transient::Stale]);
        let session = &self.session;

        self.poll_until(
            &format!("all of {} to be visible", locator),
            &spec,
            || async move {
                let elements = session.find_elements(locator).await?;
                if elements.is_empty() {
                    return Ok(None);
                }
                for element in &elements {
                    if !session.is_displayed(element).await? {
                        return Ok(None);
                    }
                }
                Ok::<_, DriverError>(Some(elements))
            },
        )
        .await
    }

    /// Wait until nothing matching `locator` is displayed.
    ///
    /// Returns `Ok(false)` instead of failing when the element is still
    /// visible at the deadline. Only interruption is reported as an error.
    pub async fn wait_not_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<bool, WaitError> {
        let spec = WaitSpec::new(timeout)
            .polling_every(ABSENCE_POLL)
            .ignoring(&[Transient::NotPresent, Transient::Stale]);
        let session = &self.session;

        let result = self
            .poll_until(
                &format!("{} to disappear", locator),
                &spec,
                || async move {
                    let elements = session.find_elements(locator).await?;
                    let Some(first) = elements.first() else {
                        return Ok::<_, DriverError>(Some(true));
                    };
                    match session.is_displayed(first).await {
                        Ok(displayed) => Ok((!displayed).then_some(true)),
                        Err(DriverError::StaleElement(_)) => Ok(Some(true)),
                        Err(e) => Err(e),
                    }
                },
            )
            .await;

        swallow_into_false(result)
    }

    /// Wait until the element's displayed value equals `text`.
    ///
    /// Checks once right away. On a mismatch it settles for half a second
    /// before polling again, all within a one second budget. A miss is
    /// `Ok(false)`.
    pub async fn wait_until_element_has_value(
        &self,
        element: &ElementRef,
        text: &str,
    ) -> Result<bool, WaitError> {
        let what = format!("{} to have value {:?}", element, text);
        if self.interrupt.is_set() {
            return Err(WaitError::Interrupted { what });
        }

        let start = Instant::now();
        let spec = WaitSpec::new(VALUE_TIMEOUT)
            .polling_every(DEFAULT_POLL)
            .ignoring(&[Transient::NotPresent, Transient::Stale]);

        match self.session.element_value(element).await {
            Ok(value) if value == text => return Ok(true),
            Ok(_) => {}
            Err(e) if spec.tolerates(&e) => {}
            Err(e) => return swallow_into_false(Err(e.into())),
        }

        tokio::time::sleep(VALUE_SETTLE.min(VALUE_TIMEOUT)).await;

        let spec = WaitSpec {
            timeout: VALUE_TIMEOUT.saturating_sub(start.elapsed()),
            ..spec
        };
        let session = &self.session;

        let result = self
            .poll_until(&what, &spec, || async move {
                let value = session.element_value(element).await?;
                Ok::<_, DriverError>((value == text).then_some(true))
            })
            .await;

        swallow_into_false(result)
    }

    /// Single-shot check: is the first element matching `locator` displayed?
    pub async fn is_element_displayed(&self, locator: &Locator) -> Result<bool, DriverError> {
        let elements = match self.session.find_elements(locator).await {
            Ok(elements) => elements,
            Err(e) if e.transient().is_some() => return Ok(false),
            Err(e) => return Err(e),
        };

        let Some(first) = elements.first() else {
            return Ok(false);
        };

        match self.session.is_displayed(first).await {
            Ok(displayed) => Ok(displayed),
            Err(e) if e.transient().is_some() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Ride out an asynchronous page operation behind a loading indicator.
    ///
    /// Gives the indicator a short window to appear, then a long one to go
    /// away. Returns whether the indicator is gone.
    pub async fn await_loading(&self, indicator: &Locator) -> Result<bool, WaitError> {
        match self.wait_element(indicator, LOADING_APPEAR_TIMEOUT).await {
            Ok(_) => log::debug!("Loading indicator {} is showing", indicator),
            Err(e @ WaitError::Interrupted { .. }) => return Err(e),
            Err(e) => log::debug!("Loading indicator {} never showed: {}", indicator, e),
        }

        let gone = self
            .wait_not_present(indicator, LOADING_DISAPPEAR_TIMEOUT)
            .await?;
        if !gone {
            log::warn!(
                "Loading indicator {} still visible after {:?}",
                indicator,
                LOADING_DISAPPEAR_TIMEOUT
            );
        }
        Ok(gone)
    }
}

/// Boolean waits report every failure except interruption as `false`
fn swallow_into_false(result: Result<bool, WaitError>) -> Result<bool, WaitError> {
    match result {
        Ok(value) => Ok(value),
        Err(e @ WaitError::Interrupted { .. }) => Err(e),
        Err(e) => {
            log::debug!("{}", e);
            Ok(false)
        }
    }
}
