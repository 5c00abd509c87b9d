use crate::{ChatModelRef, Env, Error, LiveResource, LlmConfig};

/// A type that knows how to create and dispose of the live resource for one
/// provider family.
///
/// A policy owns at most one resource in its lifetime. Once released, it
/// can't be used to create another one, a new policy instance is required.
pub trait ClientPolicy: Send + 'static {
    /// Creates the live resource from the configuration's credential and
    /// endpoint fields, falling back to `env` and then to the library
    /// defaults.
    ///
    /// Fails with [`ErrorKind::ProviderAuth`](crate::ErrorKind) if the
    /// credentials resolve to nothing, and with
    /// [`ErrorKind::ProviderUnavailable`](crate::ErrorKind) if the resource
    /// cannot be opened.
    fn create_resource(
        &mut self,
        config: &LlmConfig,
        env: &Env,
    ) -> impl Future<Output = Result<LiveResource, Error>> + Send;

    /// Releases the resource.
    ///
    /// This method is idempotent: calling it on a policy that has already
    /// released its resource, or never created one, does nothing. Failures
    /// while closing are logged by the policy and never returned.
    fn release_resource(&mut self) -> impl Future<Output = ()> + Send;

    /// Returns the resource currently owned by this policy.
    fn resource(&self) -> Option<&LiveResource>;
}

/// The policy type of providers that need no managed resource.
///
/// This type can't be instantiated.
#[derive(Debug)]
pub enum NoClientPolicy {}

impl ClientPolicy for NoClientPolicy {
    async fn create_resource(
        &mut self,
        _config: &LlmConfig,
        _env: &Env,
    ) -> Result<LiveResource, Error> {
        match *self {}
    }

    async fn release_resource(&mut self) {
        match *self {}
    }

    fn resource(&self) -> Option<&LiveResource> {
        match *self {}
    }
}

/// A provider family: the per-provider half of the resource factory.
///
/// The factory looks a provider up by class identifier, asks it for a
/// fresh policy, lets the policy create the live resource, and finally
/// asks the provider to build the model object with the resource and its
/// own field table.
pub trait LlmProvider: Send + Sync + 'static {
    /// The policy type managing this provider's live resource.
    type Policy: ClientPolicy;

    /// Creates a fresh policy for one factory call, or `None` if the
    /// provider needs no managed resource.
    fn create_policy(&self) -> Option<Self::Policy>;

    /// Builds the model object.
    ///
    /// `resource` is the live resource created by the policy, if any. The
    /// implementation must not close it.
    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        env: &Env,
    ) -> Result<ChatModelRef, Error>;
}

/// The resource state machine shared by the policies.
///
/// A slot goes from empty to active once, and from active to released
/// once. It never goes back.
#[derive(Debug, Default)]
pub struct ResourceSlot {
    state: SlotState,
}

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Empty,
    Active(LiveResource),
    Released,
}

impl ResourceSlot {
    /// Checks that a resource can still be created with this slot.
    pub fn ensure_empty(&self, policy: &str) -> Result<(), Error> {
        match self.state {
            SlotState::Empty => Ok(()),
            SlotState::Active(_) => Err(Error::other(format!(
                "{policy} already owns a live resource"
            ))),
            SlotState::Released => Err(Error::other(format!(
                "{policy} has released its resource and cannot be reused"
            ))),
        }
    }

    /// Stores a newly created resource and returns a handle to it.
    ///
    /// If the slot is not empty, the previous state is kept and the given
    /// resource is closed right away.
    pub fn fill(
        &mut self,
        policy: &str,
        resource: LiveResource,
    ) -> Result<LiveResource, Error> {
        if let Err(err) = self.ensure_empty(policy) {
            resource.close().ok();
            return Err(err);
        }
        self.state = SlotState::Active(resource.clone());
        Ok(resource)
    }

    /// Returns the active resource.
    #[inline]
    pub fn get(&self) -> Option<&LiveResource> {
        match &self.state {
            SlotState::Active(resource) => Some(resource),
            _ => None,
        }
    }

    /// Moves the slot to the released state, returning the resource that
    /// should be closed, if any.
    pub fn take(&mut self) -> Option<LiveResource> {
        match std::mem::replace(&mut self.state, SlotState::Released) {
            SlotState::Active(resource) => Some(resource),
            SlotState::Empty | SlotState::Released => None,
        }
    }

    /// Returns `true` if the slot has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        matches!(self.state, SlotState::Released)
    }
}
