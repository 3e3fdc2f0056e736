//! Serialization tags of configuration tree nodes.

/// Kind of a node in the build configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Config,
    DimgGroup,
    Dimg,
    DimgArtifact,
    DockerDimg,
    DockerArtifact,
    ShellDimg,
    ShellArtifact,
    StageCommand,
    ArtifactGroup,
    ArtifactExport,
    GitArtifact,
    GitArtifactLocal,
    GitArtifactLocalExport,
    StageDependencies,
    GitArtifactRemote,
    GitArtifactRemoteExport,
    Mount,
    Symbol,
}

// Indexed by `NodeKind as usize`
const NODE_TAGS: [&str; 19] = [
    "!ruby/object:Dapp::Config::Config",
    "!ruby/object:Dapp::Dimg::Config::Directive::DimgGroup",
    "!ruby/object:Dapp::Dimg::Config::Directive::Dimg",
    "!ruby/object:Dapp::Dimg::Config::Directive::ArtifactDimg",
    "!ruby/object:Dapp::Dimg::Config::Directive::Docker::Dimg",
    "!ruby/object:Dapp::Dimg::Config::Directive::Docker::Artifact",
    "!ruby/object:Dapp::Dimg::Config::Directive::Shell::Dimg",
    "!ruby/object:Dapp::Dimg::Config::Directive::Shell::Artifact",
    "!ruby/object:Dapp::Dimg::Config::Directive::Shell::Dimg::StageCommand",
    "!ruby/object:Dapp::Dimg::Config::Directive::ArtifactGroup",
    "!ruby/object:Dapp::Dimg::Config::Directive::Artifact::Export",
    "!ruby/object:Dapp::Dimg::Config::Directive::Dimg::InstanceMethods::GitArtifact",
    "!ruby/object:Dapp::Dimg::Config::Directive::GitArtifactLocal",
    "!ruby/object:Dapp::Dimg::Config::Directive::GitArtifactLocal::Export",
    "!ruby/object:Dapp::Dimg::Config::Directive::GitArtifactLocal::Export::StageDependencies",
    "!ruby/object:Dapp::Dimg::Config::Directive::GitArtifactRemote",
    "!ruby/object:Dapp::Dimg::Config::Directive::GitArtifactRemote::Export",
    "!ruby/object:Dapp::Dimg::Config::Directive::Mount",
    "!ruby/symbol",
];

impl NodeKind {
    pub const ALL: [NodeKind; 19] = [
        NodeKind::Config,
        NodeKind::DimgGroup,
        NodeKind::Dimg,
        NodeKind::DimgArtifact,
        NodeKind::DockerDimg,
        NodeKind::DockerArtifact,
        NodeKind::ShellDimg,
        NodeKind::ShellArtifact,
        NodeKind::StageCommand,
        NodeKind::ArtifactGroup,
        NodeKind::ArtifactExport,
        NodeKind::GitArtifact,
        NodeKind::GitArtifactLocal,
        NodeKind::GitArtifactLocalExport,
        NodeKind::StageDependencies,
        NodeKind::GitArtifactRemote,
        NodeKind::GitArtifactRemoteExport,
        NodeKind::Mount,
        NodeKind::Symbol,
    ];

    /// Serialization tag of this kind.
    pub fn tag(self) -> &'static str {
        NODE_TAGS[self as usize]
    }

    /// Reverse lookup of [`NodeKind::tag`].
    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// A configuration node type with a fixed kind.
pub trait TaggedNode {
    const KIND: NodeKind;

    fn tag() -> &'static str {
        Self::KIND.tag()
    }
}
