//! Lifecycle callback contexts.
//!
//! These types model what the external orchestration layer hands the
//! driver on each callback: the resource's current attributes and, for
//! networks, the ordered provider segment descriptors (only the first is
//! consulted).

/// One provider segment descriptor of a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// Segmentation type name (only "vlan" is supported).
    pub network_type: String,
    /// String-encoded segmentation tag.
    pub segmentation_id: String,
    /// Provider segment identifier.
    pub id: String,
}

impl SegmentDescriptor {
    /// Creates a segment descriptor.
    pub fn new(
        network_type: impl Into<String>,
        segmentation_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            network_type: network_type.into(),
            segmentation_id: segmentation_id.into(),
            id: id.into(),
        }
    }

    /// Creates a VLAN segment descriptor.
    pub fn vlan(segmentation_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new("vlan", segmentation_id, id)
    }
}

/// Network attributes passed to network lifecycle callbacks.
#[derive(Debug, Clone, Default)]
pub struct NetworkContext {
    /// Logical network ID.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Provider segmentation tag attribute, present on delete callbacks.
    pub segmentation_id: Option<String>,
    /// Ordered provider segments, present on create callbacks.
    pub segments: Vec<SegmentDescriptor>,
}

impl NetworkContext {
    /// Creates a network context.
    pub fn new(id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            segmentation_id: None,
            segments: Vec::new(),
        }
    }

    /// Appends a provider segment descriptor.
    pub fn with_segment(mut self, segment: SegmentDescriptor) -> Self {
        self.segments.push(segment);
        self
    }

    /// Sets the provider segmentation tag attribute.
    pub fn with_segmentation_id(mut self, segmentation_id: impl Into<String>) -> Self {
        self.segmentation_id = Some(segmentation_id.into());
        self
    }
}

/// Port attributes passed to port lifecycle callbacks.
#[derive(Debug, Clone, Default)]
pub struct PortContext {
    /// Logical port ID.
    pub id: String,
    /// Owning network ID.
    pub network_id: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Compute host the port is bound to.
    pub host_id: String,
}

impl PortContext {
    /// Creates a port context.
    pub fn new(
        id: impl Into<String>,
        network_id: impl Into<String>,
        tenant_id: impl Into<String>,
        host_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            network_id: network_id.into(),
            tenant_id: tenant_id.into(),
            host_id: host_id.into(),
        }
    }
}

/// Subnet attributes passed to subnet lifecycle callbacks.
///
/// Subnet provisioning is a defined no-op; the context exists for
/// interface completeness.
#[derive(Debug, Clone, Default)]
pub struct SubnetContext {
    /// Logical subnet ID.
    pub id: String,
    /// Owning network ID.
    pub network_id: String,
    /// Owning tenant.
    pub tenant_id: String,
}

impl SubnetContext {
    /// Creates a subnet context.
    pub fn new(
        id: impl Into<String>,
        network_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            network_id: network_id.into(),
            tenant_id: tenant_id.into(),
        }
    }
}
