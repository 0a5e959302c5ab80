use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported cloud providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    pub const ALL: [CloudProvider; 3] = [Self::Aws, Self::Azure, Self::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CloudProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            "gcp" => Ok(Self::Gcp),
            _ => Err(format!("Invalid cloud provider: {s}")),
        }
    }
}

/// Provider-specific resource vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Ec2Instance,
    EbsVolume,
    EbsSnapshot,
    ElasticIp,
    LoadBalancer,
    S3Bucket,
    RdsInstance,
    AzureVm,
    AzureDisk,
    GceInstance,
    GceDisk,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ec2Instance => "ec2_instance",
            Self::EbsVolume => "ebs_volume",
            Self::EbsSnapshot => "ebs_snapshot",
            Self::ElasticIp => "elastic_ip",
            Self::LoadBalancer => "load_balancer",
            Self::S3Bucket => "s3_bucket",
            Self::RdsInstance => "rds_instance",
            Self::AzureVm => "azure_vm",
            Self::AzureDisk => "azure_disk",
            Self::GceInstance => "gce_instance",
            Self::GceDisk => "gce_disk",
        }
    }

    /// The provider whose API exposes this resource type
    pub fn provider(&self) -> CloudProvider {
        match self {
            Self::Ec2Instance
            | Self::EbsVolume
            | Self::EbsSnapshot
            | Self::ElasticIp
            | Self::LoadBalancer
            | Self::S3Bucket
            | Self::RdsInstance => CloudProvider::Aws,
            Self::AzureVm | Self::AzureDisk => CloudProvider::Azure,
            Self::GceInstance | Self::GceDisk => CloudProvider::Gcp,
        }
    }

    /// Whether the type supports a `stop` remediation (compute that can be powered off)
    pub fn is_stoppable(&self) -> bool {
        matches!(
            self,
            Self::Ec2Instance | Self::RdsInstance | Self::AzureVm | Self::GceInstance
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ec2_instance" => Ok(Self::Ec2Instance),
            "ebs_volume" => Ok(Self::EbsVolume),
            "ebs_snapshot" => Ok(Self::EbsSnapshot),
            "elastic_ip" => Ok(Self::ElasticIp),
            "load_balancer" => Ok(Self::LoadBalancer),
            "s3_bucket" => Ok(Self::S3Bucket),
            "rds_instance" => Ok(Self::RdsInstance),
            "azure_vm" => Ok(Self::AzureVm),
            "azure_disk" => Ok(Self::AzureDisk),
            "gce_instance" => Ok(Self::GceInstance),
            "gce_disk" => Ok(Self::GceDisk),
            _ => Err(format!("Invalid resource type: {s}")),
        }
    }
}
