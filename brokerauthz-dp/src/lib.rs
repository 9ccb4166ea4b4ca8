/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod directory;
pub mod authz {
    //! Authorization objects.

    mod acl_binding;
    mod acl_operation;
    mod authorization_action;
    mod authz_error;
    mod resource_type;

    pub use self::acl_binding::AclBinding;
    pub use self::acl_operation::AclOperation;
    pub use self::authorization_action::AuthorizationAction;
    pub use self::authorization_action::AuthorizationResult;
    pub use self::authz_error::AuthzError;
    pub use self::authz_error::AuthzErrorKind;
    pub use self::resource_type::ResourceType;
}
